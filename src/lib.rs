//! Style rules with safe autofixes for JavaScript and TypeScript syntax trees.
//!
//! Trees come from an external ESTree parser. Rules match patterns over the tree, its scopes,
//! tokens, comments, and the file system, and attach non-overlapping text patches.

#![deny(clippy::all, unused_crate_dependencies)]

pub mod casing;
pub mod cli;
pub mod config;
pub mod engine;
pub mod fixes;
pub mod fs;
pub mod host;
pub mod patch;
pub mod report;
pub mod rules;
pub mod scope;
pub mod source;
pub mod typedefs;

#[cfg(test)]
mod testing;

pub mod prelude {
	pub use color_eyre::{Result, eyre};
}

pub use cli::Cli;
