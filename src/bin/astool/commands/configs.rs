//! `astool configs` command

use anyhow::{Context, Result};

use crate::cli::ConfigsArgs;
use astool::Project;

pub fn execute(args: ConfigsArgs) -> Result<()> {
    let project = Project::open(&args.project)
        .with_context(|| format!("failed to open project at {}", args.project.display()))?;

    let configs = project.build_configs()?;
    if configs.is_empty() {
        eprintln!("no build configurations found");
        return Ok(());
    }

    for config in configs {
        println!("{:<24}{:<24}{}", config.name, config.hardware, config.target);
    }
    Ok(())
}
