//! # slnsync-solution
//!
//! Reading and writing IDE solution files in both dialects: the
//! line-oriented legacy `.sln` text and the XML `.slnx` format.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use slnsync_core::SolutionFile;
//! use slnsync_solution::{parse_solution, write_to_text};
//!
//! fn reorder(path: &str, text: &str) -> Option<String> {
//!     let solution = SolutionFile::new(path).ok()?;
//!     let parsed = parse_solution(&solution, text, false).ok()?;
//!     Some(write_to_text(&solution, &parsed.projects))
//! }
//! ```

pub mod error;
pub mod parser;
pub mod writer;

pub use error::{ParseIssue, SolutionError};
pub use parser::{parse, parse_solution, parse_xml, ParsedSolution};
pub use writer::{write_to, write_to_text};
