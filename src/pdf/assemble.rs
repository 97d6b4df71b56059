//! Image-to-PDF assembly using lopdf
//!
//! Every image becomes one page holding a single DCT (JPEG) image XObject.
//! Images are always re-encoded so the quality setting applies uniformly and
//! transparency is flattened before it reaches the PDF.

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::{debug, info, warn};

use super::progress::AssemblyProgress;
use crate::error::{Error, Result};
use crate::format::is_image_file;
use crate::imaging::{encode_jpeg, load_flattened};
use crate::layout::{place_image, PageSize, Placement};

/// Value written to the document info `Producer` entry
pub const PRODUCER: &str = "MangaPDF";

/// Default JPEG quality for re-encoded pages
pub const DEFAULT_QUALITY: u8 = 90;

/// Options for assembling images into a PDF
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Image file paths in page order (trailer already appended)
    pub image_paths: Vec<PathBuf>,
    /// Output PDF file path
    pub output_path: PathBuf,
    /// Page size mode
    pub page_size: PageSize,
    /// JPEG quality (1-100)
    pub quality: u8,
    /// Margin in millimeters, ignored for [`PageSize::Original`]
    pub margin_mm: f32,
    /// Skip unreadable images instead of failing the whole document
    pub skip_unreadable: bool,
    /// Document title
    pub title: Option<String>,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            image_paths: Vec::new(),
            output_path: PathBuf::from("output.pdf"),
            page_size: PageSize::Original,
            quality: DEFAULT_QUALITY,
            margin_mm: 0.0,
            skip_unreadable: false,
            title: None,
        }
    }
}

/// What an assembly run produced
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyReport {
    pub output_path: PathBuf,
    pub page_count: usize,
    pub skipped: Vec<PathBuf>,
    pub bytes_written: u64,
}

/// Assemble the given images into a single PDF file
///
/// # Example
///
/// ```no_run
/// use manga_pdf::pdf::{assemble_pdf, AssembleOptions, NoProgress};
/// use std::path::PathBuf;
///
/// let options = AssembleOptions {
///     image_paths: vec![PathBuf::from("001.jpg"), PathBuf::from("002.png")],
///     output_path: PathBuf::from("chapter.pdf"),
///     ..Default::default()
/// };
///
/// assemble_pdf(&options, &NoProgress).expect("Failed to assemble");
/// ```
pub fn assemble_pdf(
    options: &AssembleOptions,
    progress: &dyn AssemblyProgress,
) -> Result<AssemblyReport> {
    if options.image_paths.is_empty() {
        return Err(Error::NoImages);
    }

    let total = options.image_paths.len();
    info!(
        "Assembling {} images into {}",
        total,
        options.output_path.display()
    );
    progress.on_start(total);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(total);
    let mut skipped = Vec::new();

    for (index, path) in options.image_paths.iter().enumerate() {
        progress.on_page(index + 1, total, path);

        let page_id = match add_image_page(&mut doc, pages_id, path, options) {
            Ok(id) => id,
            Err(e) if options.skip_unreadable && is_skippable(&e) => {
                warn!("Skipping {}: {}", path.display(), e);
                progress.on_skipped(path, &e.to_string());
                skipped.push(path.clone());
                continue;
            }
            Err(e) => return Err(e),
        };
        kids.push(Object::Reference(page_id));
    }

    if kids.is_empty() {
        return Err(Error::NoImages);
    }

    let page_count = kids.len();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(info_dictionary(options.title.as_deref()));
    doc.trailer.set("Info", info_id);

    progress.on_writing(&options.output_path);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    fs::write(&options.output_path, &buffer)?;

    let report = AssemblyReport {
        output_path: options.output_path.clone(),
        page_count,
        skipped,
        bytes_written: buffer.len() as u64,
    };

    info!(
        "Wrote {} pages to {}",
        report.page_count,
        report.output_path.display()
    );
    progress.on_complete(&report);

    Ok(report)
}

/// Errors that concern a single input image rather than the whole job
fn is_skippable(err: &Error) -> bool {
    matches!(
        err,
        Error::ImageLoad { .. } | Error::UnsupportedFormat(_) | Error::FileNotFound(_)
    )
}

/// Decode one image and append it as a page, returning the page object id
fn add_image_page(
    doc: &mut Document,
    pages_id: ObjectId,
    path: &Path,
    options: &AssembleOptions,
) -> Result<ObjectId> {
    if !is_image_file(path) {
        return Err(Error::UnsupportedFormat(path.to_path_buf()));
    }

    let rgb = load_flattened(path)?;
    let (width, height) = rgb.dimensions();
    let jpeg = encode_jpeg(&rgb, options.quality)?;
    debug!(
        "Encoded {} ({}x{}) -> {} bytes",
        path.display(),
        width,
        height,
        jpeg.len()
    );

    let image_id = doc.add_object(image_xobject(width, height, jpeg));

    let placement = place_image(options.page_size, options.margin_mm, width, height);
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        draw_image_content(&placement).into_bytes(),
    ));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(placement.page_width),
            Object::Real(placement.page_height),
        ],
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => image_id,
            },
        },
        "Contents" => content_id,
    });

    Ok(page_id)
}

/// Image XObject carrying already-encoded JPEG bytes
fn image_xobject(width: u32, height: u32, jpeg: Vec<u8>) -> Stream {
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "DCTDecode",
    };
    // JPEG data must not be flate-compressed a second time
    Stream::new(dict, jpeg).with_compression(false)
}

/// Content stream that scales the unit image square onto the placement box
fn draw_image_content(placement: &Placement) -> String {
    format!(
        "q\n{:.4} 0 0 {:.4} {:.4} {:.4} cm\n/Im0 Do\nQ\n",
        placement.width, placement.height, placement.x, placement.y
    )
}

fn info_dictionary(title: Option<&str>) -> lopdf::Dictionary {
    let created = chrono::Local::now().format("D:%Y%m%d%H%M%S").to_string();
    let mut info = dictionary! {
        "Producer" => Object::String(PRODUCER.as_bytes().to_vec(), StringFormat::Literal),
        "Creator" => Object::String(PRODUCER.as_bytes().to_vec(), StringFormat::Literal),
        "CreationDate" => Object::String(created.into_bytes(), StringFormat::Literal),
    };
    if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
        info.set("Title", text_string(title));
    }
    info
}

/// Encode a PDF text string, using UTF-16BE with BOM for non-ASCII text
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::NoProgress;

    #[test]
    fn test_empty_input_is_rejected() {
        let options = AssembleOptions::default();
        let result = assemble_pdf(&options, &NoProgress);
        assert!(matches!(result, Err(Error::NoImages)));
    }

    #[test]
    fn test_draw_content_uses_placement() {
        let placement = Placement {
            page_width: 100.0,
            page_height: 200.0,
            x: 10.0,
            y: 20.0,
            width: 80.0,
            height: 160.0,
        };
        assert_eq!(
            draw_image_content(&placement),
            "q\n80.0000 0 0 160.0000 10.0000 20.0000 cm\n/Im0 Do\nQ\n"
        );
    }

    #[test]
    fn test_text_string_encodings() {
        assert_eq!(
            text_string("Vol 1"),
            Object::String(b"Vol 1".to_vec(), StringFormat::Literal)
        );
        match text_string("漫画") {
            Object::String(bytes, StringFormat::Hexadecimal) => {
                assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
                assert_eq!(bytes.len(), 2 + 2 * 2);
            }
            other => panic!("unexpected object {:?}", other),
        }
    }

    #[test]
    fn test_image_xobject_is_dct() {
        let stream = image_xobject(4, 3, vec![0xFF, 0xD8]);
        assert_eq!(stream.dict.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
        assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), 4);
        assert!(!stream.allows_compression);
    }
}
