//! # wpd - WPD Archive Library
//!
//! Reader, writer and text patcher for WPD game data archives.
//!
//! A WPD archive stores fixed-layout, big-endian records under short names,
//! together with an interned string table. Record layouts are described by
//! [`Format`] schemas whose fields may be bound to [`Enum`] tables of
//! symbolic values. Archives are edited by applying text patch scripts and
//! can be dumped back to the same notation.
//!
//! ## Features
//!
//! - Word-aligned byte buffer codec with bit-field access ([`Chunk`])
//! - Archive load/save with string interning ([`WpdArchive`])
//! - YAML schema descriptors with enum inheritance ([`SchemaRegistry`])
//! - Idempotent text patches and schema-aware dumps
//!
//! ## Examples
//!
//! ```no_run
//! use wpd::{DirectorySource, EntryFilter, SchemaRegistry, WpdArchive};
//!
//! # fn main() -> Result<(), wpd::Error> {
//! let registry = SchemaRegistry::new(DirectorySource::new("schema"));
//!
//! let mut archive = WpdArchive::load("sys/db/item.wdb")?;
//! let report = archive.patch_file("patch/item.txt", "item", &registry)?;
//! for change in &report.changes {
//!     println!("{}.{}: {change}", change.entry, change.attribute);
//! }
//! if archive.is_modified() {
//!     archive.save("sys/db/item.wdb")?;
//! }
//!
//! if let Some(format) = registry.get_format("item") {
//!     archive.convert_with_format_to_file(
//!         "patch/item.txt",
//!         &format,
//!         &registry,
//!         &EntryFilter::new("it_*"),
//!         false,
//!     )?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod archive;
pub mod chunk;
pub mod convert;
pub mod enumeration;
pub mod error;
pub mod filter;
pub mod format;
pub mod header;
pub mod patch;
pub mod registry;
pub mod schema_loader;
pub mod value;

// Re-export commonly used types
pub use archive::{STRING_ENTRY, STRING_TYPE_ENTRY, WpdArchive};
pub use chunk::Chunk;
pub use convert::ConvertReport;
pub use enumeration::Enum;
pub use error::{Error, Result};
pub use filter::EntryFilter;
pub use format::{Attribute, Format};
pub use header::{DirectoryRecord, WpdHeader};
pub use patch::{Diagnostic, FieldChange, PatchReport};
pub use registry::SchemaRegistry;
pub use schema_loader::{DirectorySource, EnumDefinition, FormatDefinition, MemorySource, SchemaSource};
pub use value::{AttributeFormat, AttributeType, AttributeValue};
