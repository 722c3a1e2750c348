//! Property-based tests for content segmentation
//!
//! Property test case counts can be configured via environment variables:
//!
//! - `PROPTEST_CASES`: Number of test cases per property (default: 64)
//! - `PROPTEST_MAX_SHRINK_ITERS`: Max shrinking iterations on failure (default: 1000)

use proptest::prelude::*;
use std::env;

use coursegen::artifacts::{SegmentedDocument, heading_title, segment};

const DEFAULT_PROPTEST_CASES: u32 = 64;

const DEFAULT_MAX_SHRINK_ITERS: u32 = 1000;

fn proptest_config() -> ProptestConfig {
    let cases = env::var("PROPTEST_CASES")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(DEFAULT_PROPTEST_CASES);

    let max_shrink_iters = env::var("PROPTEST_MAX_SHRINK_ITERS")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(DEFAULT_MAX_SHRINK_ITERS);

    ProptestConfig {
        cases,
        max_shrink_iters,
        ..ProptestConfig::default()
    }
}

/// Content lines never start with c, m or s, so they cannot read as keyword headings.
fn arb_content_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[abdefghijklnopqrtuvwxyz][a-z ]{0,24}",
        "- [a-z][a-z ]{0,16}",
        "[0-9]\\. [a-z ]{1,16}",
    ]
}

fn arb_heading_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "#{1,3} [A-Za-z][A-Za-z0-9 ]{0,20}",
        "(Module|MODULE|module) [0-9]{1,2}(: [a-z ]{1,12})?",
        "(Section|Chapter) [0-9]{1,2}",
        Just("#".to_string()),
    ]
}

fn arb_line() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => arb_content_line(),
        2 => arb_heading_line(),
        1 => "[ \t]{0,4}",
    ]
    .prop_flat_map(|line| {
        ("[ \t]{0,2}", "[ \t]{0,2}").prop_map(move |(lead, trail)| format!("{lead}{line}{trail}"))
    })
}

fn arb_raw_text() -> impl Strategy<Value = String> {
    (prop::collection::vec(arb_line(), 0..40), prop::bool::ANY).prop_map(|(lines, crlf)| {
        lines.join(if crlf { "\r\n" } else { "\n" })
    })
}

/// Canonical text form of a document; segmenting it again must reproduce the document.
fn reserialize(doc: &SegmentedDocument) -> String {
    let mut out = Vec::new();
    for (index, section) in doc.sections().iter().enumerate() {
        let heading = if !section.title.is_empty() {
            Some(format!("# {}", section.title))
        } else if index > 0 || section.blocks.is_empty() || section.blank_lines_before > 0 {
            Some("#".to_string())
        } else {
            None
        };
        if let Some(heading) = heading {
            out.extend(std::iter::repeat_n(String::new(), section.blank_lines_before));
            out.push(heading);
        }
        for (gap, block) in section.spaced_blocks() {
            out.extend(std::iter::repeat_n(String::new(), gap));
            out.push(block.to_string());
        }
    }
    out.join("\n")
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn prop_segmentation_is_deterministic(raw in arb_raw_text()) {
        prop_assert_eq!(segment(&raw), segment(&raw));
    }

    #[test]
    fn prop_resegmenting_canonical_form_is_identity(raw in arb_raw_text()) {
        let doc = segment(&raw);
        let again = segment(&reserialize(&doc));
        prop_assert_eq!(again, doc);
    }

    #[test]
    fn prop_blocks_are_trimmed_and_non_empty(raw in arb_raw_text()) {
        let doc = segment(&raw);
        for section in doc.sections() {
            prop_assert_eq!(section.title.trim(), section.title.as_str());
            for block in &section.blocks {
                prop_assert!(!block.is_empty());
                prop_assert_eq!(block.trim(), block.as_str());
                prop_assert!(heading_title(block).is_none());
            }
        }
    }

    #[test]
    fn prop_every_content_line_becomes_one_block(raw in arb_raw_text()) {
        let expected_blocks = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && heading_title(line).is_none())
            .count();
        let expected_headings = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && heading_title(line).is_some())
            .count();

        let doc = segment(&raw);
        prop_assert_eq!(doc.block_count(), expected_blocks);

        // Only the implicit leading section has no heading line of its own
        let implicit = doc.sections().first().is_some_and(|s| s.is_implicit() && !s.blocks.is_empty())
            && heading_title(raw.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("")).is_none();
        prop_assert_eq!(doc.len(), expected_headings + usize::from(implicit));
    }
}

#[test]
fn test_keyword_heading_without_hash() {
    let doc = segment("Module 1\nTopic A\nTopic B");
    assert_eq!(doc.len(), 1);
    assert_eq!(doc.sections()[0].title, "Module 1");
    assert_eq!(doc.sections()[0].blocks, vec!["Topic A", "Topic B"]);
}

#[test]
fn test_intro_lands_in_implicit_section() {
    let doc = segment("intro line\n# Module 1\n- a\n- b");
    assert_eq!(doc.len(), 2);
    assert!(doc.sections()[0].is_implicit());
    assert_eq!(doc.sections()[0].blocks, vec!["intro line"]);
    assert_eq!(doc.sections()[1].title, "Module 1");
    assert_eq!(doc.sections()[1].blocks, vec!["- a", "- b"]);
}
