//! Plain text from uploaded documents.

use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::ExtractError;

/// Document formats the ingest pipeline accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    /// Infer the kind from a file name's extension.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::UnsupportedType` for unknown or missing extensions.
    pub fn from_file_name(name: &str) -> Result<Self, ExtractError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "txt" | "md" => Ok(Self::Text),
            _ => Err(ExtractError::UnsupportedType(name.to_owned())),
        }
    }
}

pub trait TextExtractor: Send + Sync {
    /// Extract readable text from `bytes`.
    ///
    /// # Errors
    ///
    /// Returns `ExtractError` when the document cannot be decoded.
    fn extract(&self, bytes: &[u8], kind: DocumentKind) -> Result<String, ExtractError>;
}

/// Extracts text from PDF, DOCX and plain text files.
#[derive(Clone, Copy, Debug, Default)]
pub struct DocumentExtractor;

impl TextExtractor for DocumentExtractor {
    fn extract(&self, bytes: &[u8], kind: DocumentKind) -> Result<String, ExtractError> {
        let text = match kind {
            DocumentKind::Pdf => pdf_text(bytes)?,
            DocumentKind::Docx => docx_text(bytes)?,
            DocumentKind::Text => String::from_utf8(bytes.to_vec())?,
        };
        Ok(text.replace("\r\n", "\n"))
    }
}

/// `pdf_extract` panics on some page-level corruption instead of erroring.
fn pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(result) => result.map_err(|err| ExtractError::Parse(err.to_string())),
        Err(_) => Err(ExtractError::Parse("pdf parser panicked".into())),
    }
}

/// Paragraphs of `word/document.xml`, separated by blank lines.
fn docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let parse = |err: &dyn std::fmt::Display| ExtractError::Parse(err.to_string());

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|err| parse(&err))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|err| parse(&err))?
        .read_to_string(&mut xml)
        .map_err(|err| parse(&err))?;

    let mut reader = Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_run_text = false;
    loop {
        match reader.read_event().map_err(|err| parse(&err))? {
            Event::Start(tag) if tag.name().as_ref() == b"w:t" => in_run_text = true,
            Event::End(tag) => match tag.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push_str("\n\n"),
                _ => {}
            },
            Event::Empty(tag) => match tag.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" => text.push('\n'),
                _ => {}
            },
            Event::Text(chunk) if in_run_text => {
                text.push_str(&chunk.unescape().map_err(|err| parse(&err))?);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn docx(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    /// A one-page PDF with a valid xref table whose page omits `/MediaBox`.
    fn pdf_without_media_box() -> Vec<u8> {
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>",
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>",
            "<< /Type /Page /Parent 2 0 R /Resources << >> /Contents 4 0 R >>",
            "<< /Length 5 >>\nstream\nBT ET\nendstream",
        ];
        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (index, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", index + 1).as_bytes());
        }
        let xref = pdf.len();
        pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
        for offset in offsets {
            pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
                objects.len() + 1
            )
            .as_bytes(),
        );
        pdf
    }

    #[test]
    fn kind_follows_extension() {
        assert_eq!(DocumentKind::from_file_name("Notes.PDF").unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_file_name("a.docx").unwrap(), DocumentKind::Docx);
        assert_eq!(DocumentKind::from_file_name("readme.md").unwrap(), DocumentKind::Text);
        assert!(matches!(
            DocumentKind::from_file_name("slides.pptx"),
            Err(ExtractError::UnsupportedType(_))
        ));
        assert!(DocumentKind::from_file_name("no_extension").is_err());
    }

    #[test]
    fn plain_text_normalizes_line_endings() {
        let text = DocumentExtractor
            .extract(b"one\r\n\r\ntwo", DocumentKind::Text)
            .unwrap();
        assert_eq!(text, "one\n\ntwo");
    }

    #[test]
    fn docx_paragraphs_become_blank_line_separated() {
        let xml = r#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Cells &amp; tissues</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">Mitochondria </w:t></w:r><w:r><w:t>make energy.</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
        let text = DocumentExtractor
            .extract(&docx(xml), DocumentKind::Docx)
            .unwrap();
        let paragraphs: Vec<&str> = text.split("\n\n").filter(|p| !p.trim().is_empty()).collect();
        assert_eq!(paragraphs, vec!["Cells & tissues", "Mitochondria make energy."]);
    }

    #[test]
    fn corrupt_docx_is_a_parse_error() {
        let result = DocumentExtractor.extract(b"not a zip", DocumentKind::Docx);
        assert!(matches!(result, Err(ExtractError::Parse(_))));
    }

    #[test]
    fn garbage_pdf_is_a_parse_error() {
        let result = DocumentExtractor.extract(b"%PDF-1.4\nnot really", DocumentKind::Pdf);
        assert!(matches!(result, Err(ExtractError::Parse(_))));
    }

    #[test]
    fn pdf_page_without_media_box_is_a_parse_error() {
        let result = DocumentExtractor.extract(&pdf_without_media_box(), DocumentKind::Pdf);
        assert!(matches!(result, Err(ExtractError::Parse(_))));
    }
}
