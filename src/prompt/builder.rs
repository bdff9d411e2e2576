//! Assembles the context message for one turn.

use crate::domain::{ContentBlock, Mode, UploadableFile};
use crate::prompt::templates;
use crate::workspace::render_tree;

/// Wrap each file in the prompt-side `FILE:` / `EOF:` delimiters.
pub fn format_file_contents(files: &[UploadableFile]) -> String {
    let mut contents = String::new();
    for file in files {
        contents.push_str(&format!("\n**************** FILE: {} ****************\n", file.path));
        contents.push_str(&file.content);
        contents.push_str(&format!("\n**************** EOF: {} ****************\n", file.path));
    }
    contents
}

/// Inputs gathered before the prompt is built.
#[derive(Debug, Clone, Default)]
pub struct ContextAssembler {
    /// Rendered "Resources:" section, if any URLs were fetched
    pub resources: Option<String>,
    /// Image data URLs
    pub images: Vec<String>,
    /// Every filter-eligible path, for the directory tree
    pub all_paths: Vec<String>,
}

impl ContextAssembler {
    pub fn new(all_paths: Vec<String>) -> Self {
        Self {
            all_paths,
            ..Default::default()
        }
    }

    pub fn with_resources(mut self, resources: Option<String>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    /// Build the ordered blocks: resources, images, then one text block with
    /// preamble, tree, file contents and the closing template.
    pub fn build(
        &self,
        requirements_history: &[String],
        mode: Mode,
        files: &[UploadableFile],
    ) -> Vec<ContentBlock> {
        let mut blocks = Vec::new();

        if let Some(resources) = &self.resources {
            blocks.push(ContentBlock::Text(resources.clone()));
        }
        for image in &self.images {
            blocks.push(ContentBlock::Image(image.clone()));
        }

        let mut text = String::new();
        text.push_str(&templates::preamble(mode));
        text.push('\n');
        text.push_str("Directory Tree:\n");
        text.push_str(&render_tree(&self.all_paths));
        text.push_str("\nFile Contents:\n");
        text.push_str(&format_file_contents(files));
        text.push('\n');
        text.push_str(&templates::closing(mode, requirements_history));
        text.push('\n');
        blocks.push(ContentBlock::Text(text));

        blocks
    }
}
