//! Drawing capability driven by the paginator.
//!
//! A [`Canvas`] receives positioned text and rectangles in layout units
//! (tenths of a millimetre) with the origin at the top-left corner of the
//! page and `y` growing downwards.  [`crate::pdf::PdfCanvas`] turns the
//! calls into a PDF document while [`RecordingCanvas`] keeps them in memory.

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// An 8-bit RGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const GRAY: Rgb = Rgb(96, 96, 96);
}

/// Font weight for drawn text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

/// Appearance of a text run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextStyle {
    /// Font size in points.
    pub size: u8,
    pub weight: FontWeight,
    pub color: Rgb,
}

impl TextStyle {
    pub fn regular(size: u8) -> Self {
        Self {
            size,
            weight: FontWeight::Regular,
            color: Rgb::BLACK,
        }
    }

    pub fn bold(size: u8) -> Self {
        Self {
            weight: FontWeight::Bold,
            ..Self::regular(size)
        }
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }
}

/// A filled and/or bordered rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub fill: Option<Rgb>,
    pub border: Option<Rgb>,
}

/// A single drawing instruction, as captured by [`RecordingCanvas`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrawOp {
    AddPage {
        width: u32,
        height: u32,
    },
    Text {
        x: u32,
        y: u32,
        style: TextStyle,
        text: String,
    },
    Rect(Rect),
}

impl fmt::Display for DrawOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddPage { width, height } => write!(f, "page {}x{}", width, height),
            Self::Text { x, y, style, text } => write!(
                f,
                "text {},{} {}pt {:?} {:?}",
                x, y, style.size, style.weight, text
            ),
            Self::Rect(rect) => write!(
                f,
                "rect {},{} {}x{} fill={:?} border={:?}",
                rect.x, rect.y, rect.width, rect.height, rect.fill, rect.border
            ),
        }
    }
}

/// Target of the report's drawing instructions.
pub trait Canvas {
    /// Starts a new page; subsequent drawing lands on it.
    fn add_page(&mut self, width: u32, height: u32) -> Result<()>;

    /// Draws `text` with its top-left corner at `(x, y)`.
    fn draw_text(&mut self, x: u32, y: u32, style: &TextStyle, text: &str) -> Result<()>;

    fn draw_rect(&mut self, rect: &Rect) -> Result<()>;

    /// Serializes the document and hands the bytes to the caller.
    fn finish(self) -> Result<Vec<u8>>
    where
        Self: Sized;
}

/// Canvas that keeps every instruction in memory.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    ops: Vec<DrawOp>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn page_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::AddPage { .. }))
            .count()
    }

    /// Returns the text runs drawn on the given 1-based page.
    pub fn texts_on_page(&self, page: usize) -> Vec<&str> {
        self.ops_on_page(page)
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Returns the instructions issued on the given 1-based page.
    pub fn ops_on_page(&self, page: usize) -> impl Iterator<Item = &DrawOp> {
        let mut current = 0;
        self.ops.iter().filter(move |op| {
            if matches!(op, DrawOp::AddPage { .. }) {
                current += 1;
                false
            } else {
                current == page
            }
        })
    }
}

impl Canvas for RecordingCanvas {
    fn add_page(&mut self, width: u32, height: u32) -> Result<()> {
        self.ops.push(DrawOp::AddPage { width, height });
        Ok(())
    }

    fn draw_text(&mut self, x: u32, y: u32, style: &TextStyle, text: &str) -> Result<()> {
        self.ops.push(DrawOp::Text {
            x,
            y,
            style: *style,
            text: text.to_string(),
        });
        Ok(())
    }

    fn draw_rect(&mut self, rect: &Rect) -> Result<()> {
        self.ops.push(DrawOp::Rect(*rect));
        Ok(())
    }

    /// Produces a line-per-instruction listing.
    fn finish(self) -> Result<Vec<u8>> {
        let mut listing = String::new();
        for op in &self.ops {
            let _ = writeln!(listing, "{}", op);
        }
        Ok(listing.into_bytes())
    }
}

impl<C: Canvas> Canvas for &mut C {
    fn add_page(&mut self, width: u32, height: u32) -> Result<()> {
        (**self).add_page(width, height)
    }

    fn draw_text(&mut self, x: u32, y: u32, style: &TextStyle, text: &str) -> Result<()> {
        (**self).draw_text(x, y, style, text)
    }

    fn draw_rect(&mut self, rect: &Rect) -> Result<()> {
        (**self).draw_rect(rect)
    }

    /// Borrowed canvases cannot serialize; the owner calls `finish` itself.
    fn finish(self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_canvas_groups_ops_by_page() {
        let mut canvas = RecordingCanvas::new();
        canvas.add_page(100, 100).unwrap();
        canvas
            .draw_text(0, 0, &TextStyle::regular(8), "first")
            .unwrap();
        canvas.add_page(100, 100).unwrap();
        canvas
            .draw_text(0, 0, &TextStyle::bold(8), "second")
            .unwrap();

        assert_eq!(canvas.page_count(), 2);
        assert_eq!(canvas.texts_on_page(1), vec!["first"]);
        assert_eq!(canvas.texts_on_page(2), vec!["second"]);
    }

    #[test]
    fn listing_has_one_line_per_op() {
        let mut canvas = RecordingCanvas::new();
        canvas.add_page(10, 20).unwrap();
        canvas
            .draw_rect(&Rect {
                x: 1,
                y: 2,
                width: 3,
                height: 4,
                fill: Some(Rgb::WHITE),
                border: None,
            })
            .unwrap();

        let listing = String::from_utf8(canvas.finish().unwrap()).unwrap();
        assert_eq!(listing.lines().count(), 2);
        assert!(listing.starts_with("page 10x20"));
    }
}
