//! Applying patch scripts to the archives of a filelist

use anyhow::{Context, Result, anyhow, bail};
use std::path::PathBuf;

use wpd::SchemaRegistry;

use super::{Directories, for_each_file, load_archive};
use crate::filelist::FileEntry;
use crate::utils::format_list;

/// Patch every archive named in `filelists` and save the modified ones
pub fn execute(directories: &Directories, filelists: &[PathBuf]) -> Result<()> {
    let registry = directories.registry();
    let mut modified = Vec::new();

    let outcome = for_each_file(filelists, |file| {
        patch_archive(directories, &registry, file, &mut modified)
    });

    println!("Modified files: {}", format_list(&modified));
    outcome
}

/// Apply every patch of `file` and save the archive when it changed.
///
/// A patch that fails is reported and the next one is still applied; the
/// file then counts as failed once the changes made so far are saved.
fn patch_archive(
    directories: &Directories,
    registry: &SchemaRegistry,
    file: &FileEntry,
    modified: &mut Vec<String>,
) -> Result<()> {
    let format = file
        .format
        .as_deref()
        .ok_or_else(|| anyhow!("Missing file \"format\" attribute"))?;

    let path = directories.archive_path(&file.name);
    let mut archive = load_archive(&path)?;

    let mut failed = 0usize;
    for patch in &file.patches {
        let script = directories.patch_path(&patch.name);
        let report = match archive
            .patch_file(&script, format, registry)
            .with_context(|| format!("Couldn't apply patch file: {}", script.display()))
        {
            Ok(report) => report,
            Err(e) => {
                log::error!("{}: {e:#}", file.name);
                failed += 1;
                continue;
            }
        };

        if report.skipped {
            log::info!("{} is up to date", script.display());
            continue;
        }
        for change in &report.changes {
            log::info!("{}.{}: {change}", change.entry, change.attribute);
        }
        if !report.is_clean() {
            log::warn!(
                "{}: {} line(s) could not be applied",
                script.display(),
                report.diagnostics.len()
            );
        }
    }

    if archive.is_modified() {
        log::info!("Saving {}", path.display());
        archive
            .save(&path)
            .with_context(|| format!("Failed to write file: {}", path.display()))?;
        modified.push(file.name.clone());
    }

    if failed > 0 {
        bail!("{failed} patch file(s) could not be applied");
    }
    Ok(())
}
