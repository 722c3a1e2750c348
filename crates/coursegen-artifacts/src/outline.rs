//! Markdown outline renderer

use coursegen_utils::error::RenderError;
use std::io::Write;
use tracing::debug;

use crate::builder::{ArtifactKind, ArtifactRenderer, RenderSummary};
use crate::segment::SegmentedDocument;

pub const OUTLINE_TITLE: &str = "AI Generated Course";

/// Renders `# title`, one `## section` per section and `- block` per block.
#[derive(Debug, Clone)]
pub struct OutlineBuilder {
    title: String,
}

impl Default for OutlineBuilder {
    fn default() -> Self {
        Self {
            title: OUTLINE_TITLE.to_string(),
        }
    }
}

impl OutlineBuilder {
    #[must_use]
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Outline lines, without trailing newlines.
    #[must_use]
    pub fn layout(&self, doc: &SegmentedDocument) -> Vec<String> {
        let mut lines = vec![format!("# {}", self.title)];
        for section in doc.sections() {
            lines.push(String::new());
            lines.push(format!("## {}", section.display_title()));
            for block in &section.blocks {
                lines.push(format!("- {}", strip_bullet(block)));
            }
        }
        lines
    }
}

/// Drop a leading list marker so blocks are not double-bulleted.
fn strip_bullet(block: &str) -> &str {
    for marker in ["- ", "* ", "• "] {
        if let Some(rest) = block.strip_prefix(marker) {
            return rest.trim_start();
        }
    }
    block
}

impl ArtifactRenderer for OutlineBuilder {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Outline
    }

    fn render(
        &self,
        doc: &SegmentedDocument,
        sink: &mut dyn Write,
    ) -> Result<RenderSummary, RenderError> {
        let lines = self.layout(doc);
        let mut text = lines.join("\n");
        text.push('\n');

        sink.write_all(text.as_bytes())?;
        debug!(lines = lines.len(), bytes = text.len(), "Rendered outline");

        Ok(RenderSummary {
            kind: ArtifactKind::Outline,
            units: lines.len(),
            bytes: text.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::segment;

    #[test]
    fn test_outline_structure() {
        let doc = segment("intro\n# Module 1\n- a\n* b\nplain");
        let builder = OutlineBuilder::default();
        let mut out = Vec::new();
        let summary = builder.render(&doc, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "# AI Generated Course\n\n## Overview\n- intro\n\n## Module 1\n- a\n- b\n- plain\n"
        );
        assert_eq!(summary.units, 9);
    }

    #[test]
    fn test_empty_document_has_title_only() {
        let lines = OutlineBuilder::with_title("T").layout(&SegmentedDocument::default());
        assert_eq!(lines, vec!["# T".to_string()]);
    }
}
