use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::{Cursor, Write};
use tracing::info;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::fonts::script_font_family;

use super::{DocumentPlan, LINE_SPACING, PARAGRAPH_SPACING, RenderError};

const DEFAULT_FAMILY: &str = "Calibri";
const ENHANCED_TITLE_SIZE: f32 = 18.0;
const DEFAULT_TITLE_SIZE: f32 = 16.0;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:eastAsia="Calibri" w:cs="Calibri"/><w:sz w:val="24"/><w:szCs w:val="24"/><w:lang w:val="en-US"/></w:rPr></w:rPrDefault><w:pPrDefault/></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:uiPriority w:val="9"/><w:qFormat/><w:pPr><w:keepNext/><w:keepLines/><w:spacing w:before="480" w:after="0"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:bCs/><w:color w:val="365F91"/><w:sz w:val="28"/><w:szCs w:val="28"/></w:rPr></w:style></w:styles>"#;

type XmlWriter = Writer<Vec<u8>>;

/// Word-processor rendering of `text`.
pub fn render_docx(text: &str, title: &str, target_language: &str) -> Result<Vec<u8>, RenderError> {
    let plan = DocumentPlan::new(text, title, target_language);
    let document = document_xml(&plan).map_err(RenderError::docx)?;
    let core = core_xml(&plan.title);
    let bytes = package(&[
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", PACKAGE_RELS.as_bytes()),
        ("docProps/core.xml", core.as_bytes()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes()),
        ("word/styles.xml", STYLES.as_bytes()),
        ("word/document.xml", &document),
    ])
    .map_err(RenderError::docx)?;
    info!(
        "generated DOCX: {} paragraphs, {} bytes, script {:?}",
        plan.paragraphs.len(),
        bytes.len(),
        plan.script
    );
    Ok(bytes)
}

fn package(parts: &[(&str, &[u8])]) -> zip::result::ZipResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, bytes) in parts {
        writer.start_file(*name, options)?;
        writer.write_all(bytes)?;
    }
    Ok(writer.finish()?.into_inner())
}

fn core_xml(title: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>{}</dc:title></cp:coreProperties>"#,
        quick_xml::escape::escape(title)
    )
}

struct RunStyle<'a> {
    family: Option<&'a str>,
    half_points: u32,
    bold: bool,
}

fn document_xml(plan: &DocumentPlan) -> quick_xml::Result<Vec<u8>> {
    let family = plan.script.map(script_font_family);
    let title_size = if plan.enhanced() {
        ENHANCED_TITLE_SIZE
    } else {
        DEFAULT_TITLE_SIZE
    };
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    let mut root = BytesStart::new("w:document");
    root.push_attribute(("xmlns:w", W_NS));
    root.push_attribute(("xmlns:r", R_NS));
    writer.write_event(Event::Start(root))?;
    writer.write_event(Event::Start(BytesStart::new("w:body")))?;

    write_title(
        &mut writer,
        &plan.title,
        &RunStyle {
            family,
            half_points: half_points(title_size),
            bold: true,
        },
    )?;
    // spacer between title and body
    writer.write_event(Event::Empty(BytesStart::new("w:p")))?;

    let body_style = RunStyle {
        family,
        half_points: half_points(plan.body_size),
        bold: false,
    };
    for paragraph in &plan.paragraphs {
        write_body_paragraph(&mut writer, paragraph, &body_style)?;
    }

    write_section(&mut writer)?;
    writer.write_event(Event::End(BytesEnd::new("w:body")))?;
    writer.write_event(Event::End(BytesEnd::new("w:document")))?;
    Ok(writer.into_inner())
}

fn write_title(writer: &mut XmlWriter, title: &str, style: &RunStyle<'_>) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new("w:p")))?;
    writer.write_event(Event::Start(BytesStart::new("w:pPr")))?;
    writer.write_event(Event::Empty(val("w:pStyle", "Heading1")))?;
    writer.write_event(Event::Empty(val("w:jc", "left")))?;
    writer.write_event(Event::End(BytesEnd::new("w:pPr")))?;
    write_run(writer, title, style)?;
    writer.write_event(Event::End(BytesEnd::new("w:p")))?;
    Ok(())
}

fn write_body_paragraph(
    writer: &mut XmlWriter,
    text: &str,
    style: &RunStyle<'_>,
) -> quick_xml::Result<()> {
    let after = twips(PARAGRAPH_SPACING).to_string();
    // 240 is single spacing for lineRule="auto"
    let line = ((240.0 * LINE_SPACING).round() as u32).to_string();
    writer.write_event(Event::Start(BytesStart::new("w:p")))?;
    writer.write_event(Event::Start(BytesStart::new("w:pPr")))?;
    let mut spacing = BytesStart::new("w:spacing");
    spacing.push_attribute(("w:after", after.as_str()));
    spacing.push_attribute(("w:line", line.as_str()));
    spacing.push_attribute(("w:lineRule", "auto"));
    writer.write_event(Event::Empty(spacing))?;
    writer.write_event(Event::End(BytesEnd::new("w:pPr")))?;
    write_run(writer, text, style)?;
    writer.write_event(Event::End(BytesEnd::new("w:p")))?;
    Ok(())
}

fn write_run(writer: &mut XmlWriter, text: &str, style: &RunStyle<'_>) -> quick_xml::Result<()> {
    let size = style.half_points.to_string();
    writer.write_event(Event::Start(BytesStart::new("w:r")))?;
    writer.write_event(Event::Start(BytesStart::new("w:rPr")))?;
    if let Some(family) = style.family {
        let mut fonts = BytesStart::new("w:rFonts");
        for slot in ["w:ascii", "w:hAnsi", "w:eastAsia", "w:cs"] {
            fonts.push_attribute((slot, family));
        }
        writer.write_event(Event::Empty(fonts))?;
    }
    if style.bold {
        writer.write_event(Event::Empty(BytesStart::new("w:b")))?;
    } else {
        writer.write_event(Event::Empty(val("w:b", "0")))?;
    }
    writer.write_event(Event::Empty(val("w:sz", &size)))?;
    writer.write_event(Event::Empty(val("w:szCs", &size)))?;
    writer.write_event(Event::End(BytesEnd::new("w:rPr")))?;
    let mut t = BytesStart::new("w:t");
    t.push_attribute(("xml:space", "preserve"));
    writer.write_event(Event::Start(t))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new("w:t")))?;
    writer.write_event(Event::End(BytesEnd::new("w:r")))?;
    Ok(())
}

fn write_section(writer: &mut XmlWriter) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new("w:sectPr")))?;
    let mut size = BytesStart::new("w:pgSz");
    size.push_attribute(("w:w", "12240"));
    size.push_attribute(("w:h", "15840"));
    writer.write_event(Event::Empty(size))?;
    let mut margins = BytesStart::new("w:pgMar");
    for (key, value) in [
        ("w:top", "1440"),
        ("w:right", "1440"),
        ("w:bottom", "1440"),
        ("w:left", "1440"),
        ("w:header", "720"),
        ("w:footer", "720"),
        ("w:gutter", "0"),
    ] {
        margins.push_attribute((key, value));
    }
    writer.write_event(Event::Empty(margins))?;
    writer.write_event(Event::End(BytesEnd::new("w:sectPr")))?;
    Ok(())
}

fn val<'a>(name: &'a str, value: &'a str) -> BytesStart<'a> {
    let mut element = BytesStart::new(name);
    element.push_attribute(("w:val", value));
    element
}

fn half_points(points: f32) -> u32 {
    (points * 2.0).round() as u32
}

fn twips(points: f32) -> u32 {
    (points * 20.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn read_part(docx: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(docx)).expect("zip");
        let mut part = archive.by_name(name).expect("part");
        let mut out = String::new();
        part.read_to_string(&mut out).expect("read part");
        out
    }

    #[test]
    fn telugu_runs_carry_script_fonts() {
        let docx = render_docx("మొదటి పేరా\n\nరెండవ పేరా", "", "telugu").unwrap();
        let xml = read_part(&docx, "word/document.xml");
        assert!(xml.contains("Translated Text (Telugu)"));
        // title + two body runs
        assert_eq!(xml.matches(r#"w:cs="Noto Sans Telugu""#).count(), 3);
        assert!(xml.contains(r#"<w:sz w:val="36"/>"#));
        assert_eq!(xml.matches(r#"<w:sz w:val="30"/>"#).count(), 2);
        assert!(xml.contains(r#"w:line="360""#));
        assert!(xml.contains(r#"w:after="240""#));
    }

    #[test]
    fn latin_document_keeps_default_font() {
        let docx = render_docx("Hello & <world>", "Report", "").unwrap();
        let xml = read_part(&docx, "word/document.xml");
        assert!(!xml.contains("w:rFonts"));
        assert!(xml.contains(r#"<w:sz w:val="32"/>"#));
        assert!(xml.contains(r#"<w:sz w:val="24"/>"#));
        assert!(xml.contains("Hello &amp; &lt;world&gt;"));
        assert!(xml.contains(">Report<"));
    }

    #[test]
    fn title_only_document_is_still_valid() {
        let docx = render_docx("\n \n", "Empty", "").unwrap();
        let xml = read_part(&docx, "word/document.xml");
        assert!(xml.contains(">Empty<"));
        assert_eq!(xml.matches("<w:r>").count(), 1);
        let core = read_part(&docx, "docProps/core.xml");
        assert!(core.contains("<dc:title>Empty</dc:title>"));
    }

    #[test]
    fn control_characters_are_not_written() {
        let docx = render_docx("Line one\u{b}still one\u{1}", "Bell\u{7}", "").unwrap();
        let xml = read_part(&docx, "word/document.xml");
        assert!(
            !xml.bytes().any(|b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r')),
            "document.xml carries a control character"
        );
        assert!(xml.contains(">Line one<"));
        assert!(xml.contains(">still one<"));
        assert!(xml.contains(">Bell<"));

        let mut reader = quick_xml::Reader::from_str(&xml);
        loop {
            match reader.read_event() {
                Ok(quick_xml::events::Event::Eof) => break,
                Ok(_) => {}
                Err(err) => panic!("malformed document.xml: {}", err),
            }
        }
    }

    #[test]
    fn package_contains_required_parts() {
        let docx = render_docx("text", "", "").unwrap();
        let archive = ZipArchive::new(Cursor::new(docx.as_slice())).expect("zip");
        let mut names = archive.file_names().collect::<Vec<_>>();
        names.sort();
        assert_eq!(
            names,
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "docProps/core.xml",
                "word/_rels/document.xml.rels",
                "word/document.xml",
                "word/styles.xml",
            ]
        );
    }
}
