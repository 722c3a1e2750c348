//! Course artifacts
//!
//! Raw model output is segmented once by [`segment`] into a [`SegmentedDocument`].
//! Every [`ArtifactRenderer`] consumes that same structure, and the
//! [`ArtifactStore`] persists the rendered bytes.

pub mod builder;
pub mod outline;
pub mod paged;
pub mod segment;
pub mod slides;
pub mod store;

pub use builder::{ArtifactKind, ArtifactRenderer, RenderSummary, render_to_vec, renderer_for};
pub use coursegen_utils::error::{RenderError, StoreError};
pub use outline::OutlineBuilder;
pub use paged::PagedDocumentBuilder;
pub use segment::{Section, SegmentedDocument, heading_title, segment};
pub use slides::SlideDeckBuilder;
pub use store::{ArtifactStore, StoredArtifact, StoredFile};
