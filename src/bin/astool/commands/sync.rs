//! `astool sync` command

use anyhow::{Context, Result};

use crate::cli::SyncArgs;
use astool::core::object::library_language;
use astool::{Library, Package};

pub fn execute(args: SyncArgs) -> Result<()> {
    let path = &args.path;

    // A library directory (or .lby file) synchronizes as a library so the
    // manifest and source-group exclusions apply; everything else is a
    // plain package.
    let is_library = if path.is_dir() {
        library_language(path).is_some()
    } else {
        path.extension().map(|e| e.eq_ignore_ascii_case("lby")).unwrap_or(false)
    };

    let synced = if is_library {
        let mut library = Library::open(path)
            .with_context(|| format!("failed to open library at {}", path.display()))?;
        library.synchronize()?;
        library.path().to_path_buf()
    } else {
        let mut package = Package::open(path)
            .with_context(|| format!("failed to open package at {}", path.display()))?;
        package.synchronize()?;
        package.path().to_path_buf()
    };

    eprintln!("Synchronized {}", synced.display());
    Ok(())
}
