//! Reading back a written PDF

use lopdf::{Dictionary, Document, Object};
use std::path::Path;

use crate::error::{Error, Result};

/// Follow a trailer or catalog reference to the dictionary it names
fn referenced_dict<'a>(doc: &'a Document, parent: &Dictionary, key: &[u8]) -> Result<&'a Dictionary> {
    let name = String::from_utf8_lossy(key);
    let id = match parent.get(key) {
        Ok(Object::Reference(id)) => *id,
        Ok(_) => return Err(Error::InvalidPdf(format!("{name} is not a reference"))),
        Err(_) => return Err(Error::InvalidPdf(format!("missing {name}"))),
    };

    match doc.get_object(id)? {
        Object::Dictionary(dict) => Ok(dict),
        _ => Err(Error::InvalidPdf(format!("{name} is not a dictionary"))),
    }
}

/// Count pages by reading the Count field from the Pages dictionary
/// This is more reliable than get_pages() which doesn't handle nested page trees
fn count_pages_from_catalog(doc: &Document) -> Result<usize> {
    let catalog = referenced_dict(doc, &doc.trailer, b"Root")?;
    let pages = referenced_dict(doc, catalog, b"Pages")?;

    match pages.get(b"Count") {
        Ok(Object::Integer(n)) if *n >= 0 => Ok(*n as usize),
        Ok(_) => Err(Error::InvalidPdf("Count is not a page count".to_string())),
        Err(_) => Err(Error::InvalidPdf("missing Count".to_string())),
    }
}

/// Decode a PDF text string (UTF-16BE with BOM, or byte-per-char)
fn decode_text(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// PDF metadata
#[derive(Debug, Clone, PartialEq)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    pub producer: Option<String>,
    pub title: Option<String>,
}

/// Extract metadata from a PDF file
pub fn extract_metadata(path: &Path) -> Result<PdfMetadata> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    let page_count = count_pages_from_catalog(&doc)?;

    let info = referenced_dict(&doc, &doc.trailer, b"Info").ok();
    let text = |key: &[u8]| -> Option<String> {
        match info?.get(key).ok()? {
            Object::String(bytes, _) => Some(decode_text(bytes)),
            _ => None,
        }
    };

    Ok(PdfMetadata {
        page_count,
        producer: text(b"Producer"),
        title: text(b"Title"),
    })
}

/// Count the number of pages in a PDF file
pub fn count_pages(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let doc = Document::load(path)?;
    count_pages_from_catalog(&doc)
}
