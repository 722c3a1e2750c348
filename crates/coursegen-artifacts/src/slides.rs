//! Slide deck renderer (Office Open XML presentation)
//!
//! The package is written part by part with the `zip` crate: content types,
//! package relationships, the presentation, one slide master, one layout, one
//! theme, and one part per slide. Placement is absolute; no placeholders are
//! inherited from the layout.

use coursegen_utils::error::RenderError;
use std::fmt::Write as _;
use std::io::{Cursor, Write};
use tracing::{debug, error};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::builder::{ArtifactKind, ArtifactRenderer, RenderSummary};
use crate::segment::SegmentedDocument;

pub const DECK_TITLE: &str = "AI Generated Course";
pub const DECK_SUBTITLE: &str = "Comprehensive Learning Program";

// 4:3 slide, EMU
const SLIDE_CX: i64 = 9_144_000;
const SLIDE_CY: i64 = 6_858_000;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// One slide in the laid-out deck
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slide {
    Title { title: String, subtitle: String },
    Content { title: String, body: Vec<String> },
}

#[derive(Debug, Clone)]
pub struct SlideDeckBuilder {
    title: String,
    subtitle: String,
}

impl Default for SlideDeckBuilder {
    fn default() -> Self {
        Self {
            title: DECK_TITLE.to_string(),
            subtitle: DECK_SUBTITLE.to_string(),
        }
    }
}

impl SlideDeckBuilder {
    /// Title slide first, then one content slide per section.
    #[must_use]
    pub fn layout(&self, doc: &SegmentedDocument) -> Vec<Slide> {
        let mut slides = Vec::with_capacity(doc.len() + 1);
        slides.push(Slide::Title {
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
        });
        slides.extend(doc.sections().iter().map(|section| Slide::Content {
            title: section.display_title().to_string(),
            body: section.blocks.clone(),
        }));
        slides
    }

    fn encode(slides: &[Slide]) -> Result<Vec<u8>, zip::result::ZipError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut put = |name: &str, body: String| -> Result<(), zip::result::ZipError> {
            zip.start_file(name, options)?;
            zip.write_all(body.as_bytes())?;
            Ok(())
        };

        put("[Content_Types].xml", content_types_xml(slides.len()))?;
        put("_rels/.rels", package_rels_xml())?;
        put("docProps/app.xml", app_xml(slides.len()))?;
        put("ppt/presentation.xml", presentation_xml(slides.len()))?;
        put(
            "ppt/_rels/presentation.xml.rels",
            presentation_rels_xml(slides.len()),
        )?;
        put("ppt/slideMasters/slideMaster1.xml", slide_master_xml())?;
        put(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            slide_master_rels_xml(),
        )?;
        put("ppt/slideLayouts/slideLayout1.xml", slide_layout_xml())?;
        put(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            slide_layout_rels_xml(),
        )?;
        put("ppt/theme/theme1.xml", theme_xml())?;

        for (index, slide) in slides.iter().enumerate() {
            let number = index + 1;
            put(&format!("ppt/slides/slide{number}.xml"), slide_xml(slide))?;
            put(
                &format!("ppt/slides/_rels/slide{number}.xml.rels"),
                slide_rels_xml(),
            )?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

impl ArtifactRenderer for SlideDeckBuilder {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::SlideDeck
    }

    fn render(
        &self,
        doc: &SegmentedDocument,
        sink: &mut dyn Write,
    ) -> Result<RenderSummary, RenderError> {
        let slides = self.layout(doc);
        let bytes = Self::encode(&slides).map_err(|e| {
            error!(error = %e, "Slide deck packaging failed");
            RenderError::Package(e.to_string())
        })?;

        sink.write_all(&bytes)?;
        debug!(slides = slides.len(), bytes = bytes.len(), "Rendered slide deck");

        Ok(RenderSummary {
            kind: ArtifactKind::SlideDeck,
            units: slides.len(),
            bytes: bytes.len(),
        })
    }
}

/// Escape text for XML element content, dropping characters XML 1.0 forbids.
fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            c => out.push(c),
        }
    }
    out
}

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

fn content_types_xml(slide_count: usize) -> String {
    let mut xml = format!(
        r#"{XML_DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#
    );
    for number in 1..=slide_count {
        let _ = write!(
            xml,
            r#"<Override PartName="/ppt/slides/slide{number}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
        );
    }
    xml.push_str("</Types>");
    xml
}

fn package_rels_xml() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_BASE}/officeDocument" Target="ppt/presentation.xml"/><Relationship Id="rId2" Type="{REL_BASE}/extended-properties" Target="docProps/app.xml"/></Relationships>"#
    )
}

fn app_xml(slide_count: usize) -> String {
    format!(
        r#"{XML_DECL}<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>coursegen</Application><Slides>{slide_count}</Slides></Properties>"#
    )
}

fn presentation_xml(slide_count: usize) -> String {
    let mut ids = String::new();
    for index in 0..slide_count {
        // rId1 master, rId2 theme, slides from rId3; slide ids start at 256
        let _ = write!(
            ids,
            r#"<p:sldId id="{}" r:id="rId{}"/>"#,
            256 + index,
            index + 3
        );
    }
    format!(
        r#"{XML_DECL}<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{ids}</p:sldIdLst><p:sldSz cx="{SLIDE_CX}" cy="{SLIDE_CY}" type="screen4x3"/><p:notesSz cx="{SLIDE_CY}" cy="{SLIDE_CX}"/></p:presentation>"#
    )
}

fn presentation_rels_xml(slide_count: usize) -> String {
    let mut rels = format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_BASE}/slideMaster" Target="slideMasters/slideMaster1.xml"/><Relationship Id="rId2" Type="{REL_BASE}/theme" Target="theme/theme1.xml"/>"#
    );
    for index in 0..slide_count {
        let _ = write!(
            rels,
            r#"<Relationship Id="rId{}" Type="{REL_BASE}/slide" Target="slides/slide{}.xml"/>"#,
            index + 3,
            index + 1
        );
    }
    rels.push_str("</Relationships>");
    rels
}

const EMPTY_TREE: &str = r#"<p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld>"#;

fn slide_master_xml() -> String {
    format!(
        r#"{XML_DECL}<p:sldMaster xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}">{EMPTY_TREE}<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#
    )
}

fn slide_master_rels_xml() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_BASE}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="{REL_BASE}/theme" Target="../theme/theme1.xml"/></Relationships>"#
    )
}

fn slide_layout_xml() -> String {
    format!(
        r#"{XML_DECL}<p:sldLayout xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" type="blank" preserve="1">{EMPTY_TREE}<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
    )
}

fn slide_layout_rels_xml() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_BASE}/slideMaster" Target="../slideMasters/slideMaster1.xml"/></Relationships>"#
    )
}

fn slide_rels_xml() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_BASE}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/></Relationships>"#
    )
}

fn theme_xml() -> String {
    let solid = |color: &str| format!(r#"<a:solidFill><a:schemeClr val="{color}"/></a:solidFill>"#);
    let line = |width: u32| {
        format!(
            r#"<a:ln w="{width}"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#
        )
    };
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";
    let fills = solid("phClr").repeat(3);
    let lines = format!("{}{}{}", line(6350), line(12700), line(19050));
    let effects = effect.repeat(3);

    format!(
        r#"{XML_DECL}<a:theme xmlns:a="{NS_A}" name="coursegen"><a:themeElements><a:clrScheme name="coursegen"><a:dk1><a:srgbClr val="000000"/></a:dk1><a:lt1><a:srgbClr val="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="1F2937"/></a:dk2><a:lt2><a:srgbClr val="F3F4F6"/></a:lt2><a:accent1><a:srgbClr val="1E3A8A"/></a:accent1><a:accent2><a:srgbClr val="166534"/></a:accent2><a:accent3><a:srgbClr val="9CA3AF"/></a:accent3><a:accent4><a:srgbClr val="F59E0B"/></a:accent4><a:accent5><a:srgbClr val="0EA5E9"/></a:accent5><a:accent6><a:srgbClr val="DC2626"/></a:accent6><a:hlink><a:srgbClr val="2563EB"/></a:hlink><a:folHlink><a:srgbClr val="7C3AED"/></a:folHlink></a:clrScheme><a:fontScheme name="coursegen"><a:majorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="coursegen"><a:fillStyleLst>{fills}</a:fillStyleLst><a:lnStyleLst>{lines}</a:lnStyleLst><a:effectStyleLst>{effects}</a:effectStyleLst><a:bgFillStyleLst>{fills}</a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#
    )
}

/// Text box placement and styling
struct TextBox<'a> {
    id: u32,
    name: &'a str,
    x: i64,
    y: i64,
    cx: i64,
    cy: i64,
    size: u32,
    bold: bool,
    paragraphs: &'a [String],
}

fn text_box_xml(shape: &TextBox<'_>) -> String {
    let mut paragraphs = String::new();
    if shape.paragraphs.is_empty() {
        paragraphs.push_str(r#"<a:p><a:endParaRPr lang="en-US"/></a:p>"#);
    }
    for text in shape.paragraphs {
        let _ = write!(
            paragraphs,
            r#"<a:p><a:r><a:rPr lang="en-US" sz="{}" b="{}" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
            shape.size,
            u8::from(shape.bold),
            xml_escape(text)
        );
    }

    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr><p:txBody><a:bodyPr wrap="square"><a:normAutofit/></a:bodyPr><a:lstStyle/>{paragraphs}</p:txBody></p:sp>"#,
        shape.id, shape.name, shape.x, shape.y, shape.cx, shape.cy
    )
}

fn slide_xml(slide: &Slide) -> String {
    let margin = 457_200;
    let width = SLIDE_CX - 2 * margin;

    let shapes = match slide {
        Slide::Title { title, subtitle } => {
            let title = [title.clone()];
            let subtitle = [subtitle.clone()];
            format!(
                "{}{}",
                text_box_xml(&TextBox {
                    id: 2,
                    name: "Title",
                    x: margin,
                    y: 2_130_425,
                    cx: width,
                    cy: 1_470_025,
                    size: 4400,
                    bold: true,
                    paragraphs: &title,
                }),
                text_box_xml(&TextBox {
                    id: 3,
                    name: "Subtitle",
                    x: margin,
                    y: 3_886_200,
                    cx: width,
                    cy: 1_752_600,
                    size: 2800,
                    bold: false,
                    paragraphs: &subtitle,
                })
            )
        }
        Slide::Content { title, body } => {
            let title = [title.clone()];
            format!(
                "{}{}",
                text_box_xml(&TextBox {
                    id: 2,
                    name: "Title",
                    x: margin,
                    y: 274_638,
                    cx: width,
                    cy: 1_143_000,
                    size: 3200,
                    bold: true,
                    paragraphs: &title,
                }),
                text_box_xml(&TextBox {
                    id: 3,
                    name: "Body",
                    x: margin,
                    y: 1_600_200,
                    cx: width,
                    cy: 4_525_963,
                    size: 1800,
                    bold: false,
                    paragraphs: body,
                })
            )
        }
    };

    format!(
        r#"{XML_DECL}<p:sld xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::segment;
    use std::io::Read;
    use zip::ZipArchive;

    fn slide_parts(bytes: &[u8]) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive
            .file_names()
            .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
            .map(ToString::to_string)
            .collect();
        names.sort();
        names
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut out = String::new();
        part.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_layout_has_title_plus_one_slide_per_section() {
        let doc = segment("intro\n# Module 1\n- a\n# Module 2");
        let slides = SlideDeckBuilder::default().layout(&doc);

        assert_eq!(slides.len(), 4);
        assert!(matches!(&slides[0], Slide::Title { title, .. } if title == DECK_TITLE));
        assert_eq!(
            slides[1],
            Slide::Content {
                title: "Overview".to_string(),
                body: vec!["intro".to_string()]
            }
        );
        assert_eq!(
            slides[3],
            Slide::Content {
                title: "Module 2".to_string(),
                body: Vec::new()
            }
        );
    }

    #[test]
    fn test_package_contains_one_part_per_slide() {
        let doc = segment("# A\nx\n# B\ny\n# C");
        let mut out = Vec::new();
        let summary = SlideDeckBuilder::default().render(&doc, &mut out).unwrap();

        assert_eq!(summary.units, 4);
        assert_eq!(summary.bytes, out.len());
        assert_eq!(slide_parts(&out).len(), 4);

        let first = read_part(&out, "ppt/slides/slide1.xml");
        assert!(first.contains(DECK_TITLE));
        assert!(first.contains(DECK_SUBTITLE));

        let presentation = read_part(&out, "ppt/presentation.xml");
        assert_eq!(presentation.matches("<p:sldId ").count(), 4);
    }

    #[test]
    fn test_empty_document_renders_title_slide_only() {
        let mut out = Vec::new();
        let summary = SlideDeckBuilder::default()
            .render(&SegmentedDocument::default(), &mut out)
            .unwrap();
        assert_eq!(summary.units, 1);
        assert_eq!(slide_parts(&out), vec!["ppt/slides/slide1.xml".to_string()]);
    }

    #[test]
    fn test_text_is_escaped() {
        let doc = segment("# Q&A <intro>\nuse \"quotes\" & 'apostrophes'\u{0007}");
        let mut out = Vec::new();
        SlideDeckBuilder::default().render(&doc, &mut out).unwrap();
        let slide = read_part(&out, "ppt/slides/slide2.xml");

        assert!(slide.contains("Q&amp;A &lt;intro&gt;"));
        assert!(slide.contains("&quot;quotes&quot; &amp; &apos;apostrophes&apos;"));
        assert!(!slide.contains('\u{0007}'));
    }
}
