//! Writing patch files from the archives of a filelist

use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;

use wpd::{EntryFilter, SchemaRegistry};

use super::{Directories, for_each_file, load_archive};
use crate::filelist::FileEntry;

/// Dump every archive named in `filelists` into its listed patch files
pub fn execute(directories: &Directories, filelists: &[PathBuf], show_hidden: bool) -> Result<()> {
    let registry = directories.registry();
    let mut written = 0usize;

    let outcome = for_each_file(filelists, |file| {
        written += generate_patches(directories, &registry, file, show_hidden)?;
        Ok(())
    });

    println!("Generated {written} patch file(s)");
    outcome
}

fn generate_patches(
    directories: &Directories,
    registry: &SchemaRegistry,
    file: &FileEntry,
    show_hidden: bool,
) -> Result<usize> {
    let format = match file.dump_format() {
        Some(name) => Some(
            registry
                .get_format(name)
                .ok_or_else(|| anyhow!("Unknown format \"{name}\""))?,
        ),
        None => None,
    };

    let archive = load_archive(&directories.archive_path(&file.name))?;

    for patch in &file.patches {
        let output = directories.patch_path(&patch.name);
        let filter = EntryFilter::new(patch.filter_pattern());

        let report = match &format {
            Some(format) => archive.convert_with_format_to_file(
                &output,
                format,
                registry,
                &filter,
                show_hidden,
            ),
            None => archive.convert_generic_to_file(&output, &filter),
        }
        .with_context(|| format!("Failed to write file: {}", output.display()))?;

        log::info!(
            "{}: {} entries written for filter \"{filter}\"",
            output.display(),
            report.entries
        );
    }

    Ok(file.patches.len())
}
