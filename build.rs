//! Build script for platform-specific resources.
//!
//! On Windows, this embeds version information (and the icon, when present)
//! into the executable so the standalone `.exe` shows up properly in Explorer.

use std::path::Path;

const ICON_PATH: &str = "assets/manga-pdf.ico";

fn main() {
    println!("cargo:rerun-if-changed={ICON_PATH}");

    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") {
        return;
    }

    let mut res = winresource::WindowsResource::new();
    res.set("ProductName", "MangaPDF");
    res.set("FileDescription", "Merge images into PDF files");
    if Path::new(ICON_PATH).exists() {
        res.set_icon(ICON_PATH);
    }
    res.compile().expect("Failed to compile Windows resources");
}
