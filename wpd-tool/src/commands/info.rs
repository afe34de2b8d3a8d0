//! Archive directory listing

use anyhow::Result;
use std::path::Path;

use wpd::{STRING_ENTRY, WpdArchive};

use super::load_archive;
use crate::utils::{add_table_row, create_table, format_bytes};

/// Print the entries of the archive at `path`
pub fn execute(path: &Path) -> Result<()> {
    let archive = load_archive(path)?;
    print_info(path, &archive);
    Ok(())
}

fn print_info(path: &Path, archive: &WpdArchive) {
    println!("WPD File Information");
    println!("====================");
    println!();
    println!("File: {}", path.display());
    println!("Entries: {}", archive.entry_count());

    let strings = archive.entry(STRING_ENTRY).map_or(0, |chunk| chunk.size());
    println!("String table: {}", format_bytes(strings as u64));
    println!();

    let mut table = create_table(&["Name", "Size"]);
    for (name, chunk) in archive.entries() {
        add_table_row(&mut table, vec![name.to_string(), chunk.size().to_string()], &[1]);
    }
    table.printstd();
}
