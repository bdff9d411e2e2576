//! Prompt assembly: templates, fetched resources, images and file contents.

pub mod builder;
pub mod images;
pub mod resources;
pub mod templates;

pub use builder::ContextAssembler;
