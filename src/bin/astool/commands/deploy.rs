//! `astool deploy` command

use std::fs;

use anyhow::{Context, Result};

use crate::cli::DeployArgs;
use astool::core::package::PACKAGE_MANIFEST;
use astool::DeploymentTable;

pub fn execute(args: DeployArgs) -> Result<()> {
    let mut table = DeploymentTable::open(&args.table)
        .with_context(|| format!("failed to open deployment table {}", args.table.display()))?;

    // With no names given, deploy everything in the folder. The folder's
    // own manifest is not a library.
    let libraries = if args.libraries.is_empty() {
        let mut found = Vec::new();
        for entry in fs::read_dir(&args.library_folder).with_context(|| {
            format!("failed to read library folder {}", args.library_folder.display())
        })? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if name != PACKAGE_MANIFEST {
                found.push(name);
            }
        }
        found.sort();
        found
    } else {
        args.libraries.clone()
    };

    for library in &libraries {
        table
            .deploy_library(&args.library_folder, library, &[])
            .with_context(|| format!("failed to deploy {library}"))?;
    }

    eprintln!(
        "Deployed {} library(s) into {}",
        libraries.len(),
        args.table.display()
    );
    Ok(())
}
