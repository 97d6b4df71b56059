//! Progress callbacks for PDF assembly
//!
//! The assembler calls these from whatever thread it runs on, so the GUI
//! worker forwards them over a channel while the CLI prints them directly.

use std::path::Path;

use super::assemble::AssemblyReport;

/// Receives events while a PDF is being assembled
///
/// All methods default to no-ops so implementors only override what they need.
pub trait AssemblyProgress: Send + Sync {
    /// Called once before the first image is processed
    fn on_start(&self, total_images: usize) {
        let _ = total_images;
    }

    /// Called before image `current` (1-indexed) is decoded
    fn on_page(&self, current: usize, total: usize, path: &Path) {
        let _ = (current, total, path);
    }

    /// Called when an image could not be read and was skipped
    fn on_skipped(&self, path: &Path, reason: &str) {
        let _ = (path, reason);
    }

    /// Called once all pages are built, before the file is written
    fn on_writing(&self, output: &Path) {
        let _ = output;
    }

    /// Called after the file was written successfully
    fn on_complete(&self, report: &AssemblyReport) {
        let _ = report;
    }
}

/// Progress sink that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl AssemblyProgress for NoProgress {}
