//! Region coordinate transform
//!
//! Regions are drawn in the editor on a page preview rendered at A4-portrait
//! width, with the origin at the top-left. PDF pages put the origin at the
//! bottom-left and may be any physical size.

/// A4 portrait width in PDF points
pub const REFERENCE_WIDTH: f64 = 595.28;

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Physical page dimensions in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

/// Map a reference-space region (top-left origin) onto a page's own frame
/// (bottom-left origin)
///
/// All four components are scaled by `page.width / REFERENCE_WIDTH`; y is
/// then flipped so the result's lower edge is measured from the page bottom.
pub fn to_page_frame(region: &Rect, page: PageSize) -> Rect {
    let scale = page.width / REFERENCE_WIDTH;

    let width = region.width * scale;
    let height = region.height * scale;

    Rect {
        x: region.x * scale,
        y: page.height - region.y * scale - height,
        width,
        height,
    }
}
