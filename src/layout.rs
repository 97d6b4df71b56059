//! Page layout calculations

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixels are assumed to be 1/96 inch when an image defines the page size
pub const DEFAULT_DPI: f32 = 96.0;

/// Simple length type in millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length(pub f32);

impl Length {
    /// Create a length from millimeters
    pub fn from_mm(mm: f32) -> Self {
        Length(mm)
    }

    /// Get the value in points (1/72 inch)
    pub fn pt(&self) -> f32 {
        self.0 * 72.0 / 25.4
    }
}

/// Page dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDimensions {
    pub width: Length,
    pub height: Length,
}

impl PageDimensions {
    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self {
            width: Length::from_mm(215.9),
            height: Length::from_mm(279.4),
        }
    }

    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self {
            width: Length::from_mm(210.0),
            height: Length::from_mm(297.0),
        }
    }
}

/// How the PDF page size is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    /// Each page takes the size of its image
    #[default]
    Original,
    A4,
    Letter,
}

impl PageSize {
    pub const ALL: [PageSize; 3] = [PageSize::Original, PageSize::A4, PageSize::Letter];

    /// Fixed paper dimensions, `None` for [`PageSize::Original`]
    pub fn dimensions(&self) -> Option<PageDimensions> {
        match self {
            PageSize::Original => None,
            PageSize::A4 => Some(PageDimensions::a4()),
            PageSize::Letter => Some(PageDimensions::letter()),
        }
    }

    /// Parse the names used on the command line and in settings
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "original" => Some(PageSize::Original),
            "a4" => Some(PageSize::A4),
            "letter" => Some(PageSize::Letter),
            _ => None,
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSize::Original => write!(f, "Original image size"),
            PageSize::A4 => write!(f, "A4"),
            PageSize::Letter => write!(f, "Letter"),
        }
    }
}

/// Where one image lands on its page, all values in points
///
/// The origin is the bottom-left corner of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub page_width: f32,
    pub page_height: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Compute the page size and image rectangle for one image
///
/// With a fixed paper size the image is scaled (up or down) to fit inside the
/// margins, keeping its aspect ratio, and centred. With
/// [`PageSize::Original`] the page matches the image and the margin is
/// ignored.
pub fn place_image(page_size: PageSize, margin_mm: f32, px_width: u32, px_height: u32) -> Placement {
    let img_w = px_width.max(1) as f32 * 72.0 / DEFAULT_DPI;
    let img_h = px_height.max(1) as f32 * 72.0 / DEFAULT_DPI;

    let Some(page) = page_size.dimensions() else {
        return Placement {
            page_width: img_w,
            page_height: img_h,
            x: 0.0,
            y: 0.0,
            width: img_w,
            height: img_h,
        };
    };

    let page_w = page.width.pt();
    let page_h = page.height.pt();
    // the same margin applies on all four sides
    let margin = Length::from_mm(margin_mm.max(0.0)).pt();

    // margins wider than the page leave a 1pt box rather than a negative one
    let box_w = (page_w - 2.0 * margin).max(1.0);
    let box_h = (page_h - 2.0 * margin).max(1.0);

    let scale = (box_w / img_w).min(box_h / img_h);
    let width = img_w * scale;
    let height = img_h * scale;

    Placement {
        page_width: page_w,
        page_height: page_h,
        x: (page_w - width) / 2.0,
        y: (page_h - height) / 2.0,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.05
    }

    #[test]
    fn test_length_in_points() {
        // one inch
        assert!((Length::from_mm(25.4).pt() - 72.0).abs() < 0.01);
    }

    #[test]
    fn test_letter_size() {
        let letter = PageDimensions::letter();
        // 8.5 x 11 inches
        assert!((letter.width.pt() - 612.0).abs() < 0.1);
        assert!((letter.height.pt() - 792.0).abs() < 0.1);
    }

    #[test]
    fn test_original_page_matches_image() {
        let placement = place_image(PageSize::Original, 10.0, 960, 1440);
        assert!(approx(placement.page_width, 720.0));
        assert!(approx(placement.page_height, 1080.0));
        assert_eq!((placement.x, placement.y), (0.0, 0.0));
        assert!(approx(placement.width, placement.page_width));
    }

    #[test]
    fn test_a4_fit_into_tall_image() {
        // A tall strip is limited by the page height
        let placement = place_image(PageSize::A4, 0.0, 100, 1000);
        let a4 = PageDimensions::a4();
        assert!(approx(placement.height, a4.height.pt()));
        assert!(approx(placement.width, a4.height.pt() / 10.0));
        assert!(approx(placement.y, 0.0));
        assert!(approx(placement.x * 2.0 + placement.width, a4.width.pt()));
    }

    #[test]
    fn test_fit_respects_margins_and_aspect() {
        let margin = 20.0;
        let placement = place_image(PageSize::Letter, margin, 3000, 2000);
        let margin_pt = Length::from_mm(margin).pt();

        assert!(placement.x >= margin_pt - 0.01);
        assert!(placement.y >= margin_pt - 0.01);
        assert!(placement.x + placement.width <= placement.page_width - margin_pt + 0.01);
        assert!(placement.y + placement.height <= placement.page_height - margin_pt + 0.01);
        assert!(approx(placement.width / placement.height, 1.5));
    }

    #[test]
    fn test_oversized_margin_leaves_minimal_box() {
        let placement = place_image(PageSize::A4, 500.0, 100, 100);
        assert!(approx(placement.width, 1.0));
        assert!(approx(placement.x * 2.0 + placement.width, placement.page_width));
    }

    #[test]
    fn test_small_image_is_scaled_up() {
        let placement = place_image(PageSize::A4, 0.0, 10, 10);
        assert!(approx(placement.width, PageDimensions::a4().width.pt()));
    }

    #[test]
    fn test_page_size_parse() {
        assert_eq!(PageSize::parse("A4"), Some(PageSize::A4));
        assert_eq!(PageSize::parse(" letter "), Some(PageSize::Letter));
        assert_eq!(PageSize::parse("original"), Some(PageSize::Original));
        assert_eq!(PageSize::parse("legal"), None);
    }
}
