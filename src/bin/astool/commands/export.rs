//! `astool export` command

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use glob::Pattern;

use crate::cli::ExportArgs;
use astool::core::BuildConfig;
use astool::ops::{export_libraries, export_library, ExportOptions, ExportParams};
use astool::util::fs::remove_dir_all_if_exists;
use astool::Project;

pub fn execute(mut args: ExportArgs) -> Result<()> {
    // A parameter file fills in anything not given on the command line.
    let mut ignore_globs: Vec<String> = Vec::new();
    if let Some(params_path) = &args.params {
        let Some(params) = ExportParams::load(params_path)
            .with_context(|| format!("failed to load {}", params_path.display()))?
        else {
            eprintln!(
                "Parameter file {} not found; wrote defaults. Fill it in and rerun.",
                params_path.display()
            );
            return Ok(());
        };
        ignore_globs = apply_params(&mut args, params);
    }

    let project_path = args
        .project
        .clone()
        .context("no project given (pass a path or --params)")?;
    let project = Project::open(&project_path)
        .with_context(|| format!("failed to open project at {}", project_path.display()))?;

    // Parameter-file ignores are globs; expand them against the
    // discovered library names.
    if !ignore_globs.is_empty() {
        let patterns = compile_patterns(&ignore_globs)?;
        for library in project.libraries() {
            if patterns.iter().any(|p| p.matches(library.name())) {
                args.blacklist.push(library.name().to_string());
            }
        }
    }

    let dest = args
        .dest
        .clone()
        .unwrap_or_else(|| project.dir_path().join("..").join("Exports"));

    // Validate requested configuration names against the project.
    let discovered = project.build_configs()?;
    let selected: Option<Vec<BuildConfig>> = if args.configs.is_empty() {
        None
    } else {
        for name in &args.configs {
            if !discovered.iter().any(|c| &c.name == name) {
                tracing::warn!("configuration {name} does not exist in project");
            }
        }
        let selected: Vec<BuildConfig> = discovered
            .into_iter()
            .filter(|c| args.configs.contains(&c.name))
            .collect();
        if selected.is_empty() {
            bail!("none of the requested configurations exist in the project");
        }
        Some(selected)
    };

    let options = ExportOptions {
        overwrite: args.overwrite,
        binary: !args.source,
        include_version: args.include_version,
    };

    let info = if let Some(lib_name) = &args.lib {
        let library = project
            .library_by_name(lib_name)
            .with_context(|| format!("library {lib_name} not found in project"))?;
        let ignores = compile_patterns(&args.ignore)?;
        export_library(&project, library, &dest, &ignores, &options, !args.no_deps)?
    } else {
        export_libraries(
            &project,
            &dest,
            selected.as_deref(),
            &args.whitelist,
            &args.blacklist,
            &options,
        )?
    };

    for failed in info.failed() {
        eprintln!(
            "failed to export {} to {}: {}",
            failed.name,
            failed.path.display(),
            failed
                .error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default()
        );
        // Leave no partial trees behind.
        if let Err(err) = remove_dir_all_if_exists(&failed.path) {
            tracing::debug!("failed to clean up {}: {err}", failed.path.display());
        }
    }

    eprintln!(
        "Export complete: {} succeeded, {} failed",
        info.success().len(),
        info.failed().len()
    );
    if !info.failed().is_empty() {
        bail!("{} export(s) failed", info.failed().len());
    }
    Ok(())
}

/// Merge a parameter file into the argument set, returning its ignore
/// globs. Command-line values win where both are present.
fn apply_params(args: &mut ExportArgs, params: ExportParams) -> Vec<String> {
    if args.project.is_none() && !params.project_path.is_empty() {
        args.project = Some(PathBuf::from(params.project_path));
    }
    if args.dest.is_none() && !params.export_path.is_empty() {
        args.dest = Some(PathBuf::from(params.export_path));
    }
    if args.configs.is_empty() {
        args.configs = params.configs;
    }
    args.overwrite |= params.overwrite;
    args.source |= params.source;
    args.include_version |= params.version_sub_folders;
    params.ignore_libraries
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("invalid ignore pattern `{p}`")))
        .collect()
}
