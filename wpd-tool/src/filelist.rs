//! Filelist documents naming the archives and patch files of a batch

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Format name that selects the generic dump
pub const DEFAULT_FORMAT: &str = "default";

/// A batch of archives to patch or dump
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileList {
    /// Archives, in processing order
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

/// One archive of a filelist
#[derive(Debug, Clone, Deserialize)]
pub struct FileEntry {
    /// Archive path relative to the data directory
    pub name: String,
    /// Format of the archive's records
    #[serde(default)]
    pub format: Option<String>,
    /// Patch files attached to the archive
    #[serde(default)]
    pub patches: Vec<PatchEntry>,
}

/// A patch file attached to an archive
#[derive(Debug, Clone, Deserialize)]
pub struct PatchEntry {
    /// Patch file path relative to the patch directory
    pub name: String,
    /// Entry name filter used when generating
    #[serde(default)]
    pub filter: Option<String>,
}

impl FileList {
    /// Read a filelist document
    pub fn load(path: &Path) -> Result<Self> {
        log::info!("Reading filelist \"{}\"", path.display());
        let text = fs::read_to_string(path)
            .with_context(|| format!("Couldn't open filelist: {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("Invalid filelist: {}", path.display()))
    }

    /// Parse a filelist document from YAML text
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }
}

impl FileEntry {
    /// Format to dump with, or `None` for the generic dump
    pub fn dump_format(&self) -> Option<&str> {
        self.format
            .as_deref()
            .filter(|format| !format.is_empty() && *format != DEFAULT_FORMAT)
    }
}

impl PatchEntry {
    /// Filter pattern, defaulting to every entry
    pub fn filter_pattern(&self) -> &str {
        self.filter.as_deref().unwrap_or("*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filelist() {
        let list = FileList::from_yaml_str(
            r#"
files:
  - name: db/resident/item.wdb
    format: item
    patches:
      - name: item.txt
        filter: "it_*;ac_*"
  - name: db/resident/ability.wdb
    patches:
      - name: ability.txt
"#,
        )
        .unwrap();

        assert_eq!(list.files.len(), 2);
        assert_eq!(list.files[0].dump_format(), Some("item"));
        assert_eq!(list.files[0].patches[0].filter_pattern(), "it_*;ac_*");
        assert_eq!(list.files[1].format, None);
        assert_eq!(list.files[1].patches[0].filter_pattern(), "*");
    }

    #[test]
    fn test_default_format_is_generic() {
        let list =
            FileList::from_yaml_str("files:\n  - { name: a.wdb, format: default }\n").unwrap();
        assert_eq!(list.files[0].dump_format(), None);
        assert!(list.files[0].patches.is_empty());
    }

    #[test]
    fn test_missing_name_is_rejected() {
        assert!(FileList::from_yaml_str("files:\n  - { format: item }\n").is_err());
    }
}
