//! MangaPDF Library
//!
//! Merges ordered sequences of images (JPG, PNG, WEBP) into PDF files.
//! This library provides functionality to:
//! - Manage up to five image sequences with an optional trailer page each
//! - Probe images and build thumbnails
//! - Lay out one image per page (original size, A4 or Letter)
//! - Assemble and inspect PDFs
//! - Run generation jobs on a background worker
//!
//! The `gui` feature (on by default) adds the iced desktop application.
//!
//! # Example
//!
//! ```no_run
//! use manga_pdf::pdf::{assemble_pdf, AssembleOptions, NoProgress};
//! use manga_pdf::sequence::Workspace;
//! use std::path::PathBuf;
//!
//! let mut workspace = Workspace::new();
//! let id = workspace.current_id();
//! workspace
//!     .add_images(id, &[PathBuf::from("002.png"), PathBuf::from("001.jpg")], None)
//!     .expect("Failed to add images");
//!
//! let options = AssembleOptions {
//!     image_paths: workspace.current().pages(None),
//!     output_path: PathBuf::from("chapter.pdf"),
//!     ..Default::default()
//! };
//!
//! assemble_pdf(&options, &NoProgress).expect("Failed to create PDF");
//! ```

pub mod error;
pub mod format;
pub mod imaging;
pub mod job;
pub mod layout;
pub mod pdf;
pub mod sequence;
pub mod settings;
pub mod system;

#[cfg(feature = "gui")]
pub mod ui;

// Re-export commonly used items
pub use error::{Error, Result};
