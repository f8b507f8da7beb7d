//! Deck assembly: write a 16:9 `.pptx` (Office Open XML) file.
//!
//! ## Layout
//!
//! | Slide   | Box      | Position (in)                 | Font                         |
//! |---------|----------|-------------------------------|------------------------------|
//! | Title   | title    | y 40%, h 1, full width        | 33pt bold #003366 Helvetica  |
//! | Title   | subtitle | y 58%, h 0.75, full width     | 18pt #888888 Helvetica       |
//! | Content | heading  | x 0.5, y 0.5, w 8.5, h 1      | 32pt bold #003366 Arial      |
//! | Content | bullet i | x 1, y 1.8 + i, w 8, h 0.75   | 15pt #333333 Arial, bulleted |
//!
//! Slide size is 10 × 5.625 in. Coordinates are written in EMU
//! (914 400 per inch).
//!
//! The package is the smallest part set PowerPoint, Keynote and LibreOffice
//! all open without repair prompts: one master, one blank layout, one theme.

use crate::error::Yt2PptxError;
use crate::output::{SlideContent, TitleDescription};
use chrono::{SecondsFormat, Utc};
use quick_xml::escape::escape;
use std::fmt::Write as _;
use std::io::{self, Seek, Write};
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const EMU_PER_INCH: i64 = 914_400;
pub const SLIDE_WIDTH_EMU: i64 = 10 * EMU_PER_INCH;
pub const SLIDE_HEIGHT_EMU: i64 = 5_143_500;

/// File-name prefix of every generated deck.
pub const DECK_FILE_PREFIX: &str = "presentation-";

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

// ── Layout ────────────────────────────────────────────────────────────────

fn inches(v: f64) -> i64 {
    (v * EMU_PER_INCH as f64).round() as i64
}

fn percent_of_height(p: i64) -> i64 {
    SLIDE_HEIGHT_EMU * p / 100
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    /// Font size in points.
    pub size_pt: u32,
    pub bold: bool,
    /// RGB hex without `#`.
    pub color: &'static str,
    pub font: &'static str,
    pub align: Align,
    pub bullet: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBox {
    pub frame: Frame,
    pub style: TextStyle,
    pub text: String,
}

const TITLE_STYLE: TextStyle = TextStyle {
    size_pt: 33,
    bold: true,
    color: "003366",
    font: "Helvetica",
    align: Align::Center,
    bullet: false,
};

const SUBTITLE_STYLE: TextStyle = TextStyle {
    size_pt: 18,
    bold: false,
    color: "888888",
    font: "Helvetica",
    align: Align::Center,
    bullet: false,
};

const HEADING_STYLE: TextStyle = TextStyle {
    size_pt: 32,
    bold: true,
    color: "003366",
    font: "Arial",
    align: Align::Center,
    bullet: false,
};

const BULLET_STYLE: TextStyle = TextStyle {
    size_pt: 15,
    bold: false,
    color: "333333",
    font: "Arial",
    align: Align::Left,
    bullet: true,
};

/// Text boxes of the title slide.
pub fn title_slide_boxes(td: &TitleDescription) -> Vec<TextBox> {
    vec![
        TextBox {
            frame: Frame {
                x: 0,
                y: percent_of_height(40),
                cx: SLIDE_WIDTH_EMU,
                cy: inches(1.0),
            },
            style: TITLE_STYLE,
            text: td.title.clone(),
        },
        TextBox {
            frame: Frame {
                x: 0,
                y: percent_of_height(58),
                cx: SLIDE_WIDTH_EMU,
                cy: inches(0.75),
            },
            style: SUBTITLE_STYLE,
            text: td.description.clone(),
        },
    ]
}

/// Text boxes of one content slide: a heading plus one box per bullet.
///
/// Bullets are stacked one inch apart; more than four run off the slide.
pub fn content_slide_boxes(slide: &SlideContent) -> Vec<TextBox> {
    let mut boxes = Vec::with_capacity(slide.content.len() + 1);
    boxes.push(TextBox {
        frame: Frame {
            x: inches(0.5),
            y: inches(0.5),
            cx: inches(8.5),
            cy: inches(1.0),
        },
        style: HEADING_STYLE,
        text: slide.title.clone(),
    });
    for (i, line) in slide.content.iter().enumerate() {
        boxes.push(TextBox {
            frame: Frame {
                x: inches(1.0),
                y: inches(1.8 + i as f64),
                cx: inches(8.0),
                cy: inches(0.75),
            },
            style: BULLET_STYLE,
            text: line.clone(),
        });
    }
    boxes
}

// ── Generated file ────────────────────────────────────────────────────────

/// A deck written to the temp directory.
///
/// The file is deleted when this value is dropped, so every exit path of a
/// run (success, error, panic unwind) cleans up after itself.
#[derive(Debug)]
pub struct GeneratedDeck {
    pub file_name: String,
    path: TempPath,
}

impl GeneratedDeck {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file for upload.
    pub async fn read_bytes(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&*self.path).await
    }

    /// Delete the file now, reporting any error.
    pub fn close(self) -> io::Result<()> {
        self.path.close()
    }
}

/// Make an owner id safe for use inside a file name.
pub fn sanitize_owner(owner_id: &str) -> String {
    let s: String = owner_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.is_empty() {
        "anonymous".to_string()
    } else {
        s
    }
}

/// Write the deck to `dir` as `presentation-<random>-userId=<owner>.pptx`.
///
/// Runs on the blocking pool; the directory is created if missing.
pub async fn build_deck(
    td: &TitleDescription,
    outline: &[SlideContent],
    owner_id: &str,
    dir: &Path,
) -> Result<GeneratedDeck, Yt2PptxError> {
    let td = td.clone();
    let outline = outline.to_vec();
    let dir: PathBuf = dir.to_path_buf();
    let suffix = format!("-userId={}.pptx", sanitize_owner(owner_id));

    let deck = tokio::task::spawn_blocking(move || -> Result<GeneratedDeck, Yt2PptxError> {
        std::fs::create_dir_all(&dir).map_err(Yt2PptxError::deck_build)?;

        let file = tempfile::Builder::new()
            .prefix(DECK_FILE_PREFIX)
            .suffix(&suffix)
            .tempfile_in(&dir)
            .map_err(Yt2PptxError::deck_build)?;

        let mut out = write_pptx(file.as_file(), &td, &outline).map_err(Yt2PptxError::deck_build)?;
        out.flush().map_err(Yt2PptxError::deck_build)?;

        let path = file.into_temp_path();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(GeneratedDeck { file_name, path })
    })
    .await
    .map_err(|e| {
        if e.is_panic() {
            Yt2PptxError::UnexpectedFailure(format!("deck writer panicked: {e}"))
        } else {
            Yt2PptxError::deck_build(e)
        }
    })??;

    info!("Wrote {} to {}", deck.file_name, deck.path().display());
    Ok(deck)
}

// ── OOXML package ─────────────────────────────────────────────────────────

/// Serialise a title slide plus one slide per outline entry into `writer`.
pub fn write_pptx<W: Write + Seek>(
    writer: W,
    td: &TitleDescription,
    outline: &[SlideContent],
) -> zip::result::ZipResult<W> {
    let mut slides = Vec::with_capacity(outline.len() + 1);
    slides.push(title_slide_boxes(td));
    slides.extend(outline.iter().map(content_slide_boxes));
    let n = slides.len();

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(writer);

    // [Content_Types].xml must be the first entry.
    let parts: Vec<(String, String)> = vec![
        ("[Content_Types].xml".into(), content_types_xml(n)),
        ("_rels/.rels".into(), root_rels_xml()),
        ("docProps/app.xml".into(), app_xml(n)),
        ("docProps/core.xml".into(), core_xml(&td.title)),
        ("ppt/presentation.xml".into(), presentation_xml(n)),
        ("ppt/_rels/presentation.xml.rels".into(), presentation_rels_xml(n)),
        ("ppt/slideMasters/slideMaster1.xml".into(), slide_master_xml()),
        (
            "ppt/slideMasters/_rels/slideMaster1.xml.rels".into(),
            slide_master_rels_xml(),
        ),
        ("ppt/slideLayouts/slideLayout1.xml".into(), slide_layout_xml()),
        (
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels".into(),
            slide_layout_rels_xml(),
        ),
        ("ppt/theme/theme1.xml".into(), theme_xml()),
    ];

    for (name, body) in parts {
        zip.start_file(name, options)?;
        zip.write_all(body.as_bytes())?;
    }

    for (i, boxes) in slides.iter().enumerate() {
        let num = i + 1;
        zip.start_file(format!("ppt/slides/slide{num}.xml"), options)?;
        zip.write_all(slide_xml(boxes).as_bytes())?;
        zip.start_file(format!("ppt/slides/_rels/slide{num}.xml.rels"), options)?;
        zip.write_all(slide_rels_xml().as_bytes())?;
    }

    debug!("Serialised {} slides", n);
    zip.finish()
}

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

fn content_types_xml(slides: usize) -> String {
    let mut s = format!(
        r#"{XML_DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#
    );
    for i in 1..=slides {
        let _ = write!(
            s,
            r#"<Override PartName="/ppt/slides/slide{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
        );
    }
    s.push_str("</Types>");
    s
}

fn root_rels_xml() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_BASE}/officeDocument" Target="ppt/presentation.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="{REL_BASE}/extended-properties" Target="docProps/app.xml"/></Relationships>"#
    )
}

fn app_xml(slides: usize) -> String {
    format!(
        r#"{XML_DECL}<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>{}</Application><PresentationFormat>On-screen Show (16:9)</PresentationFormat><Slides>{slides}</Slides></Properties>"#,
        env!("CARGO_PKG_NAME")
    )
}

fn core_xml(title: &str) -> String {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    format!(
        r#"{XML_DECL}<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{}</dc:title><dc:creator>{}</dc:creator><dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{now}</dcterms:modified></cp:coreProperties>"#,
        escape(title),
        env!("CARGO_PKG_NAME")
    )
}

// presentation.xml.rels: rId1 master, rId2 theme, rId3.. slides.
fn presentation_xml(slides: usize) -> String {
    let mut ids = String::new();
    for i in 0..slides {
        let _ = write!(ids, r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 3);
    }
    format!(
        r#"{XML_DECL}<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{ids}</p:sldIdLst><p:sldSz cx="{SLIDE_WIDTH_EMU}" cy="{SLIDE_HEIGHT_EMU}"/><p:notesSz cx="{SLIDE_HEIGHT_EMU}" cy="{SLIDE_WIDTH_EMU}"/></p:presentation>"#
    )
}

fn presentation_rels_xml(slides: usize) -> String {
    let mut s = format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_BASE}/slideMaster" Target="slideMasters/slideMaster1.xml"/><Relationship Id="rId2" Type="{REL_BASE}/theme" Target="theme/theme1.xml"/>"#
    );
    for i in 1..=slides {
        let _ = write!(
            s,
            r#"<Relationship Id="rId{}" Type="{REL_BASE}/slide" Target="slides/slide{i}.xml"/>"#,
            i + 2
        );
    }
    s.push_str("</Relationships>");
    s
}

const EMPTY_SP_TREE: &str = r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree>"#;

fn slide_master_xml() -> String {
    format!(
        r#"{XML_DECL}<p:sldMaster xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>{EMPTY_SP_TREE}</p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#
    )
}

fn slide_master_rels_xml() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_BASE}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="{REL_BASE}/theme" Target="../theme/theme1.xml"/></Relationships>"#
    )
}

fn slide_layout_xml() -> String {
    format!(
        r#"{XML_DECL}<p:sldLayout xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" type="blank" preserve="1"><p:cSld name="Blank">{EMPTY_SP_TREE}</p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
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
    let solid = |v: &str| format!(r#"<a:solidFill><a:schemeClr val="{v}"/></a:solidFill>"#);
    let fills = format!("{}{}{}", solid("phClr"), solid("phClr"), solid("phClr"));
    let line = |w: u32| format!(r#"<a:ln w="{w}"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#);
    let lines = format!("{}{}{}", line(6350), line(12700), line(19050));
    let effects = "<a:effectStyle><a:effectLst/></a:effectStyle>".repeat(3);
    format!(
        r#"{XML_DECL}<a:theme xmlns:a="{NS_A}" name="Office Theme"><a:themeElements><a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="003366"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2><a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2><a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4><a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme><a:fontScheme name="Office"><a:majorFont><a:latin typeface="Arial"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Arial"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Office"><a:fillStyleLst>{fills}</a:fillStyleLst><a:lnStyleLst>{lines}</a:lnStyleLst><a:effectStyleLst>{effects}</a:effectStyleLst><a:bgFillStyleLst>{fills}</a:bgFillStyleLst></a:fmtScheme></a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>"#
    )
}

fn slide_xml(boxes: &[TextBox]) -> String {
    let mut shapes = String::new();
    for (i, b) in boxes.iter().enumerate() {
        // id 1 is the group shape.
        shapes.push_str(&shape_xml(i + 2, b));
    }
    format!(
        r#"{XML_DECL}<p:sld xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>{shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#
    )
}

fn shape_xml(id: usize, b: &TextBox) -> String {
    let Frame { x, y, cx, cy } = b.frame;
    let s = &b.style;
    let algn = match s.align {
        Align::Left => "l",
        Align::Center => "ctr",
    };
    let ppr = if s.bullet {
        format!(
            r#"<a:pPr marL="285750" indent="-285750" algn="{algn}"><a:buFont typeface="Arial"/><a:buChar char="&#8226;"/></a:pPr>"#
        )
    } else {
        format!(r#"<a:pPr algn="{algn}"><a:buNone/></a:pPr>"#)
    };
    let bold = if s.bold { "1" } else { "0" };
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr><p:txBody><a:bodyPr wrap="square" rtlCol="0" anchor="ctr"><a:normAutofit/></a:bodyPr><a:lstStyle/><a:p>{ppr}<a:r><a:rPr lang="en-US" sz="{sz}" b="{bold}" dirty="0"><a:solidFill><a:srgbClr val="{color}"/></a:solidFill><a:latin typeface="{font}"/><a:cs typeface="{font}"/></a:rPr><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#,
        sz = s.size_pt * 100,
        color = s.color,
        font = s.font,
        text = escape(b.text.as_str()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn td() -> TitleDescription {
        TitleDescription {
            title: "Rust & <Friends>".into(),
            description: "A tour of \"safe\" systems code".into(),
        }
    }

    fn outline(n: usize) -> Vec<SlideContent> {
        (0..n)
            .map(|i| SlideContent {
                title: format!("Slide {}", i + 1),
                content: vec!["first".into(), "second".into(), "third".into()],
            })
            .collect()
    }

    fn read_entry(zip: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut s = String::new();
        zip.by_name(name).unwrap().read_to_string(&mut s).unwrap();
        s
    }

    #[test]
    fn layout_in_emu() {
        assert_eq!(inches(1.0), 914_400);
        assert_eq!(SLIDE_WIDTH_EMU, 9_144_000);
        assert_eq!(inches(5.625), SLIDE_HEIGHT_EMU);

        let boxes = title_slide_boxes(&td());
        assert_eq!(boxes[0].frame.y, 2_057_400);
        assert_eq!(boxes[0].frame.cx, SLIDE_WIDTH_EMU);
        assert_eq!(boxes[0].style.size_pt, 33);
        assert_eq!(boxes[1].frame.y, 2_983_230);
        assert_eq!(boxes[1].style.color, "888888");
    }

    #[test]
    fn bullets_step_one_inch() {
        let boxes = content_slide_boxes(&outline(1)[0]);
        assert_eq!(boxes.len(), 4);
        assert_eq!(boxes[0].frame.x, inches(0.5));
        assert_eq!(boxes[1].frame.y, inches(1.8));
        assert_eq!(boxes[2].frame.y, inches(2.8));
        assert_eq!(boxes[3].frame.y, inches(3.8));
        assert!(boxes[1..].iter().all(|b| b.style.bullet));
        assert!(!boxes[0].style.bullet);
    }

    #[test]
    fn package_has_one_slide_per_outline_entry_plus_title() {
        let buf = write_pptx(Cursor::new(Vec::new()), &td(), &outline(3))
            .unwrap()
            .into_inner();
        let mut zip = ZipArchive::new(Cursor::new(buf)).unwrap();

        assert_eq!(zip.by_index(0).unwrap().name(), "[Content_Types].xml");
        let slides = zip
            .file_names()
            .filter(|n| n.starts_with("ppt/slides/slide"))
            .count();
        assert_eq!(slides, 4);

        let ct = read_entry(&mut zip, "[Content_Types].xml");
        assert!(ct.contains("/ppt/slides/slide4.xml"));
        assert!(!ct.contains("/ppt/slides/slide5.xml"));

        let pres = read_entry(&mut zip, "ppt/presentation.xml");
        assert!(pres.contains(r#"<p:sldSz cx="9144000" cy="5143500"/>"#));
        assert_eq!(pres.matches("<p:sldId ").count(), 4);
    }

    #[test]
    fn text_is_escaped_and_ordered() {
        let buf = write_pptx(Cursor::new(Vec::new()), &td(), &outline(2))
            .unwrap()
            .into_inner();
        let mut zip = ZipArchive::new(Cursor::new(buf)).unwrap();

        let title = read_entry(&mut zip, "ppt/slides/slide1.xml");
        assert!(title.contains("Rust &amp; &lt;Friends&gt;"));
        assert!(title.contains("&quot;safe&quot;"));
        assert!(title.contains(r#"sz="3300""#));

        let second = read_entry(&mut zip, "ppt/slides/slide3.xml");
        assert!(second.contains("<a:t>Slide 2</a:t>"));
        let first = second.find("<a:t>first</a:t>").unwrap();
        let third = second.find("<a:t>third</a:t>").unwrap();
        assert!(first < third);
    }

    #[test]
    fn sanitizes_owner_ids() {
        assert_eq!(sanitize_owner("user_42-a"), "user_42-a");
        assert_eq!(sanitize_owner("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_owner(""), "anonymous");
    }

    #[tokio::test]
    async fn build_deck_names_file_and_deletes_on_drop() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("ppt-generator");

        let deck = build_deck(&td(), &outline(2), "user_42", &nested)
            .await
            .unwrap();
        assert!(deck.file_name.starts_with("presentation-"));
        assert!(deck.file_name.ends_with("-userId=user_42.pptx"));
        assert!(deck.path().starts_with(&nested));

        let bytes = deck.read_bytes().await.unwrap();
        let zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert!(zip.len() > 10);

        let path = deck.path().to_path_buf();
        assert!(path.exists());
        drop(deck);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn close_removes_file() {
        let dir = TempDir::new().unwrap();
        let deck = build_deck(&td(), &outline(1), "u", dir.path()).await.unwrap();
        let path = deck.path().to_path_buf();
        deck.close().unwrap();
        assert!(!path.exists());
    }
}
