//! Reading host-generated project files and rewriting them into either the
//! legacy or the SDK project dialect.
//!
//! [`generate_project`] is the entry point: load a [`ProjectDocument`], pick a
//! [`ProjectStyle`] and write the returned [`GeneratedProject`] wherever it
//! says.

pub mod document;
pub mod error;
mod legacy;
pub mod resharper;
mod sdk;
pub mod transform;
pub mod xml;

pub use document::{assembly_definition_name, ProjectDocument};
pub use error::ProjectError;
pub use sdk::TARGET_FRAMEWORK;
pub use transform::{
    generate_project, remove_excluded_analyzers, GeneratedProject, ProjectStyle, ReferenceResolver,
};
