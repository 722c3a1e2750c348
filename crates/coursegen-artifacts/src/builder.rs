//! Artifact renderer abstraction

use coursegen_utils::error::RenderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

use crate::outline::OutlineBuilder;
use crate::paged::PagedDocumentBuilder;
use crate::segment::SegmentedDocument;
use crate::slides::SlideDeckBuilder;

/// Kind of rendered artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    SlideDeck,
    PagedDocument,
    Outline,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [Self::SlideDeck, Self::PagedDocument, Self::Outline];

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::SlideDeck => "pptx",
            Self::PagedDocument => "pdf",
            Self::Outline => "md",
        }
    }

    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::SlideDeck => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            Self::PagedDocument => "application/pdf",
            Self::Outline => "text/markdown; charset=utf-8",
        }
    }

    /// Human-readable name, used in user-facing failure messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::SlideDeck => "PowerPoint",
            Self::PagedDocument => "PDF",
            Self::Outline => "outline",
        }
    }

    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.extension().eq_ignore_ascii_case(ext))
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SlideDeck => write!(f, "slide_deck"),
            Self::PagedDocument => write!(f, "paged_document"),
            Self::Outline => write!(f, "outline"),
        }
    }
}

/// What a renderer produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderSummary {
    pub kind: ArtifactKind,
    /// Slides, pages, or lines depending on `kind`
    pub units: usize,
    pub bytes: usize,
}

/// Renders a segmented document into one artifact format.
///
/// Implementations lay the document out in memory and encode it completely
/// before the first byte reaches `sink`.
pub trait ArtifactRenderer: Send + Sync {
    fn kind(&self) -> ArtifactKind;

    /// Render `doc` into `sink`.
    ///
    /// # Errors
    ///
    /// Returns `RenderError` if encoding fails or the sink rejects a write.
    fn render(
        &self,
        doc: &SegmentedDocument,
        sink: &mut dyn Write,
    ) -> Result<RenderSummary, RenderError>;
}

/// Default renderer for a kind.
#[must_use]
pub fn renderer_for(kind: ArtifactKind) -> Box<dyn ArtifactRenderer> {
    match kind {
        ArtifactKind::SlideDeck => Box::new(SlideDeckBuilder::default()),
        ArtifactKind::PagedDocument => Box::new(PagedDocumentBuilder::default()),
        ArtifactKind::Outline => Box::new(OutlineBuilder::default()),
    }
}

/// Render into a fresh buffer.
///
/// # Errors
///
/// Propagates the renderer's `RenderError`.
pub fn render_to_vec(
    renderer: &dyn ArtifactRenderer,
    doc: &SegmentedDocument,
) -> Result<(Vec<u8>, RenderSummary), RenderError> {
    let mut buffer = Vec::new();
    let summary = renderer.render(doc, &mut buffer)?;
    Ok((buffer, summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_round_trip_for_every_kind() {
        for kind in ArtifactKind::ALL {
            assert_eq!(ArtifactKind::from_extension(kind.extension()), Some(kind));
            assert_eq!(renderer_for(kind).kind(), kind);
        }
        assert_eq!(ArtifactKind::from_extension("PDF"), Some(ArtifactKind::PagedDocument));
        assert_eq!(ArtifactKind::from_extension("docx"), None);
    }

    #[test]
    fn test_labels_match_failure_messages() {
        assert_eq!(ArtifactKind::SlideDeck.label(), "PowerPoint");
        assert_eq!(ArtifactKind::PagedDocument.label(), "PDF");
    }
}
