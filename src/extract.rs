//! Document text extraction for uploaded files (PDF, DOCX, plain text).
//!
//! Turns file bytes plus a content type into UTF-8 text for the field
//! extractor. Failures are returned as [`ExtractError`]; the ingest pipeline
//! reports them and carries on with empty text.

use anyhow::Context;
use std::io::Read;
use std::path::Path;

use query_desk_core::extract::extract;
use query_desk_core::Record;
use thiserror::Error;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TEXT: &str = "text/plain";
pub const MIME_MARKDOWN: &str = "text/markdown";

/// Maximum decompressed bytes read from `word/document.xml` (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;
const DOCX_BODY: &str = "word/document.xml";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(String),
    #[error("text is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

/// Content type for a document path, by extension.
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(MIME_PDF),
        "docx" => Some(MIME_DOCX),
        "txt" | "text" => Some(MIME_TEXT),
        "md" | "markdown" => Some(MIME_MARKDOWN),
        _ => None,
    }
}

/// Extract plain text from document bytes.
pub fn extract_text(bytes: &[u8], content_type: &str) -> Result<String, ExtractError> {
    match content_type {
        MIME_PDF => extract_pdf(bytes),
        MIME_DOCX => extract_docx(bytes),
        MIME_TEXT | MIME_MARKDOWN => Ok(std::str::from_utf8(bytes)?.to_string()),
        _ => Err(ExtractError::UnsupportedContentType(
            content_type.to_string(),
        )),
    }
}

/// Read a document from disk and run the field extractor on its text.
///
/// Text that cannot be extracted is logged and treated as empty, which
/// yields the sentinel record. Only an unreadable file or an unknown
/// extension is an error.
pub fn extract_document(path: &Path) -> anyhow::Result<Record> {
    let content_type = content_type_for(path)
        .ok_or_else(|| anyhow::anyhow!("Unsupported file type: {}", path.display()))?;
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    let text = match extract_text(&bytes, content_type) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "text extraction failed; using empty text");
            String::new()
        }
    };
    Ok(extract(&text))
}

/// `qdesk extract`: print one document's record as JSON.
pub fn run_extract(path: &Path) -> anyhow::Result<()> {
    let record = extract_document(path)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    let entry = archive
        .by_name(DOCX_BODY)
        .map_err(|_| ExtractError::Docx(format!("{} not found", DOCX_BODY)))?;

    let mut xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut xml)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    if xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::Docx(format!(
            "{} exceeds size limit ({} bytes)",
            DOCX_BODY, MAX_XML_ENTRY_BYTES
        )));
    }
    docx_paragraphs(&xml)
}

/// Collect `<w:t>` runs, one line per `<w:p>` paragraph.
fn docx_paragraphs(xml: &[u8]) -> Result<String, ExtractError> {
    use quick_xml::events::Event;

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"p" => current.clear(),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" => current.push('\n'),
                b"p" => paragraphs.push(String::new()),
                _ => {}
            },
            Ok(Event::Text(te)) if in_text => {
                let text = te
                    .unescape()
                    .map_err(|e| ExtractError::Docx(e.to_string()))?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(paragraphs.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_with_body(body: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            zip.start_file(DOCX_BODY, zip::write::SimpleFileOptions::default())
                .unwrap();
            let xml = format!(
                "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
                body
            );
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn unsupported_content_type_returns_error() {
        let err = extract_text(b"foo", "application/octet-stream").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedContentType(_)));
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_text(b"not a pdf", MIME_PDF).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn invalid_zip_returns_error_for_docx() {
        let err = extract_text(b"not a zip", MIME_DOCX).unwrap_err();
        assert!(matches!(err, ExtractError::Docx(_)));
    }

    #[test]
    fn docx_paragraphs_are_joined_by_newlines() {
        let bytes = docx_with_body(
            "<w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p>\
             <w:p><w:r><w:t xml:space=\"preserve\">jane@example.com </w:t></w:r><w:r><w:t>Rust &amp; Go</w:t></w:r></w:p>",
        );
        let text = extract_text(&bytes, MIME_DOCX).unwrap();
        assert_eq!(text, "Jane Doe\njane@example.com Rust & Go");
    }

    #[test]
    fn docx_without_body_is_an_error() {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            zip.start_file("other.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"<x/>").unwrap();
            zip.finish().unwrap();
        }
        assert!(matches!(
            extract_text(&buf, MIME_DOCX).unwrap_err(),
            ExtractError::Docx(_)
        ));
    }

    #[test]
    fn plain_text_must_be_utf8() {
        assert_eq!(extract_text(b"hello", MIME_TEXT).unwrap(), "hello");
        assert!(matches!(
            extract_text(&[0xff, 0xfe], MIME_TEXT).unwrap_err(),
            ExtractError::Encoding(_)
        ));
    }

    #[test]
    fn content_type_by_extension() {
        assert_eq!(content_type_for(Path::new("a/b.PDF")), Some(MIME_PDF));
        assert_eq!(content_type_for(Path::new("cv.docx")), Some(MIME_DOCX));
        assert_eq!(content_type_for(Path::new("notes.md")), Some(MIME_MARKDOWN));
        assert_eq!(content_type_for(Path::new("data.csv")), None);
        assert_eq!(content_type_for(Path::new("README")), None);
    }

    #[test]
    fn docx_document_goes_through_field_extractor() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cv.docx");
        std::fs::write(
            &path,
            docx_with_body(
                "<w:p><w:r><w:t>Ada Lovelace</w:t></w:r></w:p>\
                 <w:p><w:r><w:t>ada@engine.example.org</w:t></w:r></w:p>",
            ),
        )
        .unwrap();
        let record = extract_document(&path).unwrap();
        assert_eq!(record.get("name"), Some("Ada Lovelace"));
        assert_eq!(record.get("contact"), Some("ada@engine.example.org"));
    }

    #[test]
    fn unknown_extension_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, "x").unwrap();
        assert!(extract_document(&path).is_err());
    }
}
