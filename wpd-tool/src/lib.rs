//! wpd-tool library
//!
//! Command-line front end for patching and dumping WPD archives.

pub mod cli;
pub mod commands;
pub mod filelist;
pub mod utils;
