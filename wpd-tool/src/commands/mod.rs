//! Command implementations

pub mod generate;
pub mod info;
pub mod patch;

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use wpd::{DirectorySource, SchemaRegistry, WpdArchive};

use crate::filelist::{FileEntry, FileList};

/// Directories a batch resolves its file names against
#[derive(Debug, Clone)]
pub struct Directories {
    /// Archive directory
    pub data: PathBuf,
    /// Patch script directory
    pub patch: PathBuf,
    /// Schema descriptor root
    pub schema: PathBuf,
}

impl Directories {
    /// Registry reading schemas from the schema directory
    pub fn registry(&self) -> SchemaRegistry {
        SchemaRegistry::new(DirectorySource::new(&self.schema))
    }

    /// Location of an archive named in a filelist
    pub fn archive_path(&self, name: &str) -> PathBuf {
        self.data.join(name)
    }

    /// Location of a patch file named in a filelist
    pub fn patch_path(&self, name: &str) -> PathBuf {
        self.patch.join(name)
    }
}

/// Run `process` on every file of every filelist.
///
/// A failing filelist or file is reported and the batch moves on; the
/// command fails at the end when anything did.
fn for_each_file<F>(filelists: &[PathBuf], mut process: F) -> Result<()>
where
    F: FnMut(&FileEntry) -> Result<()>,
{
    let mut failures = 0usize;

    for path in filelists {
        let list = match FileList::load(path) {
            Ok(list) => list,
            Err(e) => {
                log::error!("{e:#}");
                failures += 1;
                continue;
            }
        };

        for file in &list.files {
            if let Err(e) = process(file) {
                log::error!("{}: {e:#}", file.name);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} file(s) could not be processed");
    }
    Ok(())
}

fn load_archive(path: &Path) -> Result<WpdArchive> {
    WpdArchive::load(path).with_context(|| format!("Couldn't open file: {}", path.display()))
}
