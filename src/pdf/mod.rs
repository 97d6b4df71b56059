//! PDF assembly and inspection

pub mod assemble;
pub mod metadata;
pub mod progress;

// Re-export commonly used items
pub use assemble::{assemble_pdf, AssembleOptions, AssemblyReport, DEFAULT_QUALITY, PRODUCER};
pub use metadata::{count_pages, extract_metadata, PdfMetadata};
pub use progress::{AssemblyProgress, NoProgress};
