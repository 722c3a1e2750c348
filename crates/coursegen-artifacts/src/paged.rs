//! Paged document renderer (PDF)
//!
//! Layout produces a flat list of [`PageElement`]s. Encoding flows them onto US
//! Letter pages with word wrapping and page breaks, using the standard Helvetica
//! fonts so no font data has to be embedded.

use coursegen_utils::error::RenderError;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};
use std::io::Write;
use tracing::{debug, error};

use crate::builder::{ArtifactKind, ArtifactRenderer, RenderSummary};
use crate::segment::SegmentedDocument;

pub const DOCUMENT_TITLE: &str = "AI Generated Course Content";

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 72.0;

const TITLE_SIZE: f32 = 24.0;
const HEADING_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 10.0;
const LINE_SPACING: f32 = 1.2;

/// Spacing after the document title
const TITLE_SPACER: f32 = 20.0;
/// Spacing after every heading and paragraph
const ELEMENT_SPACER: f32 = 6.0;
/// Spacing for each blank input line
const BLANK_LINE_SPACER: f32 = 6.0;

/// One laid-out element of the document
#[derive(Debug, Clone, PartialEq)]
pub enum PageElement {
    Title(String),
    Heading(String),
    Paragraph(String),
    /// Vertical space in points
    Spacer(f32),
}

#[derive(Debug, Clone)]
pub struct PagedDocumentBuilder {
    title: String,
}

impl Default for PagedDocumentBuilder {
    fn default() -> Self {
        Self {
            title: DOCUMENT_TITLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FontFace {
    Regular,
    Bold,
}

impl FontFace {
    fn resource_name(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
        }
    }
}

/// One positioned line of text on a page
#[derive(Debug, Clone)]
struct PlacedLine {
    face: FontFace,
    size: f32,
    y: f32,
    text: Vec<u8>,
    rgb: (f32, f32, f32),
}

impl PagedDocumentBuilder {
    /// Title, then a heading per section followed by one paragraph per block,
    /// with spacers between elements. Each blank input line adds a spacer where
    /// it occurred.
    #[must_use]
    pub fn layout(&self, doc: &SegmentedDocument) -> Vec<PageElement> {
        let mut elements = vec![
            PageElement::Title(self.title.clone()),
            PageElement::Spacer(TITLE_SPACER),
        ];
        for section in doc.sections() {
            push_blank_lines(&mut elements, section.blank_lines_before);
            elements.push(PageElement::Heading(section.display_title().to_string()));
            elements.push(PageElement::Spacer(ELEMENT_SPACER));
            for (gap, block) in section.spaced_blocks() {
                push_blank_lines(&mut elements, gap);
                elements.push(PageElement::Paragraph(block.to_string()));
                elements.push(PageElement::Spacer(ELEMENT_SPACER));
            }
        }
        elements
    }

    /// Flow elements onto pages.
    ///
    /// A heading starts a new page unless the heading, its spacer and one body
    /// line all fit above the bottom margin.
    fn paginate(elements: &[PageElement]) -> Vec<Vec<PlacedLine>> {
        let usable_width = PAGE_WIDTH - 2.0 * MARGIN;
        let bottom = MARGIN;
        let top = PAGE_HEIGHT - MARGIN;

        let mut pages: Vec<Vec<PlacedLine>> = vec![Vec::new()];
        let mut cursor = top;

        for element in elements {
            let (face, size, rgb, text) = match element {
                PageElement::Spacer(points) => {
                    cursor -= points;
                    continue;
                }
                PageElement::Title(text) => (FontFace::Bold, TITLE_SIZE, (0.0, 0.0, 0.545), text),
                PageElement::Heading(text) => {
                    (FontFace::Bold, HEADING_SIZE, (0.0, 0.392, 0.0), text)
                }
                PageElement::Paragraph(text) => (FontFace::Regular, BODY_SIZE, (0.0, 0.0, 0.0), text),
            };

            let leading = size * LINE_SPACING;
            let lines = wrap_text(text, face, size, usable_width);

            if matches!(element, PageElement::Heading(_)) {
                let needed =
                    lines.len() as f32 * leading + ELEMENT_SPACER + BODY_SIZE * LINE_SPACING;
                let page_has_content = pages.last().is_some_and(|page| !page.is_empty());
                if page_has_content && cursor - needed < bottom {
                    pages.push(Vec::new());
                    cursor = top;
                }
            }

            for line in lines {
                if cursor - leading < bottom {
                    pages.push(Vec::new());
                    cursor = top;
                }
                cursor -= leading;
                if let Some(page) = pages.last_mut() {
                    page.push(PlacedLine {
                        face,
                        size,
                        y: cursor,
                        text: encode_win_ansi(&line),
                        rgb,
                    });
                }
            }
        }

        pages
    }

    fn encode(pages: &[Vec<PlacedLine>], title: &str) -> Result<Vec<u8>, lopdf::Error> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for lines in pages {
            let page_id = Self::add_page(&mut doc, pages_id, lines)?;
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(encode_win_ansi(title), StringFormat::Literal),
            "Producer" => Object::string_literal("coursegen"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }

    fn add_page(
        doc: &mut Document,
        pages_id: ObjectId,
        lines: &[PlacedLine],
    ) -> Result<ObjectId, lopdf::Error> {
        let mut operations = Vec::with_capacity(lines.len() * 6);
        for line in lines {
            let (r, g, b) = line.rgb;
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![line.face.resource_name().into(), line.size.into()],
            ));
            operations.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
            operations.push(Operation::new("Td", vec![MARGIN.into(), line.y.into()]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(line.text.clone(), StringFormat::Literal)],
            ));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        Ok(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        }))
    }
}

impl ArtifactRenderer for PagedDocumentBuilder {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::PagedDocument
    }

    fn render(
        &self,
        doc: &SegmentedDocument,
        sink: &mut dyn Write,
    ) -> Result<RenderSummary, RenderError> {
        let elements = self.layout(doc);
        let pages = Self::paginate(&elements);
        let bytes = Self::encode(&pages, &self.title).map_err(|e| {
            error!(error = %e, "PDF encoding failed");
            RenderError::Pdf(e.to_string())
        })?;

        sink.write_all(&bytes)?;
        debug!(
            elements = elements.len(),
            pages = pages.len(),
            bytes = bytes.len(),
            "Rendered paged document"
        );

        Ok(RenderSummary {
            kind: ArtifactKind::PagedDocument,
            units: pages.len(),
            bytes: bytes.len(),
        })
    }
}

fn push_blank_lines(elements: &mut Vec<PageElement>, count: usize) {
    elements.extend(std::iter::repeat_n(PageElement::Spacer(BLANK_LINE_SPACER), count));
}

/// Approximate Helvetica advance width in em units.
fn char_width(c: char, face: FontFace) -> f32 {
    let base = match c {
        ' ' => 0.278,
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '!' | '|' | 'I' => 0.278,
        'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '-' => 0.333,
        'm' | 'M' | 'W' => 0.833,
        'w' => 0.722,
        c if c.is_ascii_uppercase() => 0.667,
        c if c.is_ascii_digit() => 0.556,
        _ => 0.556,
    };
    match face {
        FontFace::Regular => base,
        FontFace::Bold => base * 1.05,
    }
}

fn text_width(text: &str, face: FontFace, size: f32) -> f32 {
    text.chars().map(|c| char_width(c, face)).sum::<f32>() * size
}

/// Greedy word wrap. Words wider than a line are split by character.
fn wrap_text(text: &str, face: FontFace, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if text_width(&candidate, face, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        if text_width(word, face, size) <= max_width {
            current = word.to_string();
        } else {
            for c in word.chars() {
                current.push(c);
                if text_width(&current, face, size) > max_width {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                }
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Encode text for the WinAnsi-encoded standard fonts. Unmappable characters
/// become `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            '\u{20AC}' => 0x80,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2026}' => 0x85,
            '\u{2122}' => 0x99,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::segment;

    #[test]
    fn test_layout_heading_per_section_and_paragraph_per_block() {
        let doc = segment("intro\n# Module 1\n- a\n- b\n# Module 2");
        let elements = PagedDocumentBuilder::default().layout(&doc);

        let headings: Vec<&str> = elements
            .iter()
            .filter_map(|e| match e {
                PageElement::Heading(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        let paragraphs = elements
            .iter()
            .filter(|e| matches!(e, PageElement::Paragraph(_)))
            .count();

        assert_eq!(elements[0], PageElement::Title(DOCUMENT_TITLE.to_string()));
        assert_eq!(headings, vec!["Overview", "Module 1", "Module 2"]);
        assert_eq!(paragraphs, 3);
    }

    #[test]
    fn test_blank_lines_become_spacers() {
        let builder = PagedDocumentBuilder::default();
        let tight = builder.layout(&segment("# A\nx\ny"));
        let spaced = builder.layout(&segment("# A\n\n\n\nx\n\n\ny"));

        // Three blank lines above "x", two above "y"
        assert_eq!(spaced.len(), tight.len() + 5);
        assert_ne!(spaced, tight);

        let x = spaced
            .iter()
            .position(|e| *e == PageElement::Paragraph("x".to_string()))
            .unwrap();
        assert_eq!(
            &spaced[x - 4..x],
            &[
                PageElement::Spacer(ELEMENT_SPACER),
                PageElement::Spacer(BLANK_LINE_SPACER),
                PageElement::Spacer(BLANK_LINE_SPACER),
                PageElement::Spacer(BLANK_LINE_SPACER),
            ]
        );
    }

    #[test]
    fn test_heading_is_not_left_at_page_bottom() {
        // 52 body lines leave 24pt above the margin: room for the heading
        // but not for the heading plus a line of its body.
        let mut elements: Vec<PageElement> = (0..52)
            .map(|i| PageElement::Paragraph(format!("line {i}")))
            .collect();
        elements.push(PageElement::Heading("Module 2".to_string()));
        elements.push(PageElement::Spacer(ELEMENT_SPACER));
        elements.push(PageElement::Paragraph("first topic".to_string()));

        let pages = PagedDocumentBuilder::paginate(&elements);

        assert_eq!(pages.len(), 2);
        assert!(pages[0].iter().all(|line| line.face == FontFace::Regular));
        assert_eq!(pages[1][0].face, FontFace::Bold);
        assert_eq!(pages[1][0].text, b"Module 2".to_vec());
        assert_eq!(pages[1][1].text, b"first topic".to_vec());
    }

    #[test]
    fn test_heading_stays_when_body_fits() {
        let elements = vec![
            PageElement::Heading("Module 1".to_string()),
            PageElement::Spacer(ELEMENT_SPACER),
            PageElement::Paragraph("topic".to_string()),
        ];
        assert_eq!(PagedDocumentBuilder::paginate(&elements).len(), 1);
    }

    #[test]
    fn test_output_parses_as_pdf() {
        let doc = segment("# Module 1\nOwnership (and borrowing) \\ lifetimes\n# Module 2\nTraits");
        let mut out = Vec::new();
        let summary = PagedDocumentBuilder::default().render(&doc, &mut out).unwrap();

        assert!(out.starts_with(b"%PDF-1.5"));
        let parsed = Document::load_mem(&out).unwrap();
        assert_eq!(parsed.get_pages().len(), summary.units);
        assert_eq!(summary.units, 1);
    }

    #[test]
    fn test_long_content_breaks_pages() {
        let body: String = (0..200)
            .map(|i| format!("Line {i} of a long module description\n"))
            .collect();
        let doc = segment(&format!("# Module 1\n{body}"));
        let mut out = Vec::new();
        let summary = PagedDocumentBuilder::default().render(&doc, &mut out).unwrap();

        assert!(summary.units > 1);
        let parsed = Document::load_mem(&out).unwrap();
        assert_eq!(parsed.get_pages().len(), summary.units);
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "word ".repeat(100);
        let lines = wrap_text(&text, FontFace::Regular, BODY_SIZE, 200.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, FontFace::Regular, BODY_SIZE) <= 200.0);
        }
    }

    #[test]
    fn test_wrap_splits_overlong_word() {
        let word = "x".repeat(300);
        let lines = wrap_text(&word, FontFace::Regular, BODY_SIZE, 100.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("A\u{2019}é漢"), vec![b'A', 0x92, 0xE9, b'?']);
    }
}
