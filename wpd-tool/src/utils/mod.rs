//! Shared utilities for the wpd-tool CLI

pub mod format;
pub mod table;

pub use format::*;
pub use table::*;
