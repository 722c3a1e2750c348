//! Heuristic content segmentation
//!
//! Splits free-form model output into titled sections. A line is a heading when,
//! after trimming, it starts with `#` or its upper-cased form starts with `MODULE`,
//! `SECTION` or `CHAPTER`. Everything else becomes a content block of the section
//! that is currently open. Blank lines never become blocks, but their positions
//! are kept so renderers can turn them back into vertical space.

use serde::Serialize;

const HEADING_KEYWORDS: [&str; 3] = ["MODULE", "SECTION", "CHAPTER"];

/// Title used by renderers for sections without a title.
pub const UNTITLED_SECTION: &str = "Overview";

/// A titled group of content lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    pub blocks: Vec<String>,
    /// Blank lines directly above the heading line
    pub blank_lines_before: usize,
    /// Blank lines directly above each block, parallel to `blocks`
    pub block_gaps: Vec<usize>,
}

impl Section {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
            blank_lines_before: 0,
            block_gaps: Vec::new(),
        }
    }

    /// Append a block preceded by `blank_lines` blank input lines.
    pub fn push_block(&mut self, text: impl Into<String>, blank_lines: usize) {
        self.blocks.push(text.into());
        self.block_gaps.push(blank_lines);
    }

    /// Blocks paired with the blank lines above each of them.
    pub fn spaced_blocks(&self) -> impl Iterator<Item = (usize, &str)> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(i, block)| (self.block_gaps.get(i).copied().unwrap_or(0), block.as_str()))
    }

    /// True for the leading section that collects text before the first heading,
    /// and for sections opened by a bare `#` line.
    #[must_use]
    pub fn is_implicit(&self) -> bool {
        self.title.is_empty()
    }

    /// Title for display; implicit sections are shown as [`UNTITLED_SECTION`].
    #[must_use]
    pub fn display_title(&self) -> &str {
        if self.is_implicit() {
            UNTITLED_SECTION
        } else {
            &self.title
        }
    }
}

/// Ordered sections produced by [`segment`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SegmentedDocument {
    sections: Vec<Section>,
}

impl SegmentedDocument {
    #[must_use]
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Total content blocks across all sections.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.sections.iter().map(|s| s.blocks.len()).sum()
    }

    #[must_use]
    pub fn into_sections(self) -> Vec<Section> {
        self.sections
    }
}

/// Title of `line` if it is a heading.
///
/// `#` markers are stripped from the front only; keyword headings keep the whole
/// trimmed line as their title.
#[must_use]
pub fn heading_title(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.starts_with('#') {
        return Some(trimmed.trim_start_matches('#').trim());
    }

    let upper = trimmed.to_uppercase();
    HEADING_KEYWORDS
        .iter()
        .any(|keyword| upper.starts_with(keyword))
        .then_some(trimmed)
}

/// Segment raw text into sections.
///
/// Blank lines never produce blocks or sections; each one is counted against the
/// heading or block that follows it, and trailing blank lines are dropped. Text
/// before the first heading lands in an implicit section with an empty title.
/// Empty input yields an empty document.
#[must_use]
pub fn segment(raw_text: &str) -> SegmentedDocument {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;
    let mut pending_blanks = 0;

    for line in raw_text.lines() {
        let line = line.trim();
        if line.is_empty() {
            pending_blanks += 1;
            continue;
        }

        if let Some(title) = heading_title(line) {
            if let Some(done) = current.take() {
                sections.push(done);
            }
            let mut section = Section::new(title);
            section.blank_lines_before = pending_blanks;
            current = Some(section);
        } else {
            current
                .get_or_insert_with(|| Section::new(""))
                .push_block(line, pending_blanks);
        }
        pending_blanks = 0;
    }

    if let Some(done) = current {
        sections.push(done);
    }

    SegmentedDocument::new(sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_input_yields_empty_document() {
        assert!(segment("").is_empty());
        assert!(segment("\n   \n\t\n").is_empty());
    }

    #[test]
    fn test_keyword_heading_with_blocks() {
        let doc = segment("Module 1\nTopic A\nTopic B");
        assert_eq!(
            doc.sections(),
            &[Section {
                title: "Module 1".to_string(),
                blocks: vec!["Topic A".to_string(), "Topic B".to_string()],
                blank_lines_before: 0,
                block_gaps: vec![0, 0],
            }]
        );
    }

    #[test]
    fn test_leading_text_goes_to_implicit_section() {
        let doc = segment("intro line\n# Module 1\n- a\n- b");
        assert_eq!(doc.len(), 2);
        assert!(doc.sections()[0].is_implicit());
        assert_eq!(doc.sections()[0].blocks, vec!["intro line"]);
        assert_eq!(doc.sections()[0].display_title(), UNTITLED_SECTION);
        assert_eq!(doc.sections()[1].title, "Module 1");
        assert_eq!(doc.sections()[1].blocks, vec!["- a", "- b"]);
    }

    #[test]
    fn test_no_headings_single_implicit_section() {
        let doc = segment("one\n\ntwo\n  three  ");
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.sections()[0].blocks, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_heading_detection_rules() {
        assert_eq!(heading_title("## Week 2"), Some("Week 2"));
        assert_eq!(heading_title("  ###   Deep dive  "), Some("Deep dive"));
        assert_eq!(heading_title("module 3: Ownership"), Some("module 3: Ownership"));
        assert_eq!(heading_title("SECTION A"), Some("SECTION A"));
        assert_eq!(heading_title("Chapter 9"), Some("Chapter 9"));
        assert_eq!(heading_title("Modules are great"), Some("Modules are great"));
        assert_eq!(heading_title("C# basics"), None);
        assert_eq!(heading_title("- Module review"), None);
        assert_eq!(heading_title("Intro"), None);
    }

    #[test]
    fn test_inner_hashes_are_kept_in_title() {
        assert_eq!(heading_title("# Learning C# and F#"), Some("Learning C# and F#"));
    }

    #[test]
    fn test_consecutive_headings_produce_empty_sections() {
        let doc = segment("# A\n# B\nbody");
        assert_eq!(doc.len(), 2);
        assert!(doc.sections()[0].blocks.is_empty());
        assert_eq!(doc.sections()[1].blocks, vec!["body"]);
        assert_eq!(doc.block_count(), 1);
    }

    #[test]
    fn test_blank_lines_are_recorded_not_emitted() {
        let doc = segment("\n# A\n\n\nx\ny\n\n# B\n\nz\n\n");
        let a = &doc.sections()[0];
        let b = &doc.sections()[1];

        assert_eq!(a.blocks, vec!["x", "y"]);
        assert_eq!(a.blank_lines_before, 1);
        assert_eq!(a.block_gaps, vec![2, 0]);
        assert_eq!(b.blank_lines_before, 1);
        assert_eq!(b.block_gaps, vec![1]);
        assert_eq!(a.spaced_blocks().collect::<Vec<_>>(), vec![(2, "x"), (0, "y")]);
    }

    #[test]
    fn test_blanks_before_implicit_text_attach_to_first_block() {
        let doc = segment("\n\nintro\n# Module 1");
        assert_eq!(doc.sections()[0].blank_lines_before, 0);
        assert_eq!(doc.sections()[0].block_gaps, vec![2]);
    }

    #[test]
    fn test_crlf_input() {
        let doc = segment("# A\r\nline\r\n");
        assert_eq!(doc.sections()[0].blocks, vec!["line"]);
    }

    proptest! {
        #[test]
        fn prop_every_inner_blank_line_is_counted(
            lines in prop::collection::vec(prop_oneof!["", "  ", "# H", "text"], 0..30)
        ) {
            let raw = lines.join("\n");
            let last_content = lines.iter().rposition(|l| !l.trim().is_empty());
            let expected = last_content
                .map_or(0, |end| lines[..end].iter().filter(|l| l.trim().is_empty()).count());

            let doc = segment(&raw);
            let counted: usize = doc
                .sections()
                .iter()
                .map(|s| s.blank_lines_before + s.block_gaps.iter().sum::<usize>())
                .sum();
            prop_assert_eq!(counted, expected);
            for section in doc.sections() {
                prop_assert_eq!(section.block_gaps.len(), section.blocks.len());
            }
        }
    }
}
