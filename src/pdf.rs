//! [`Canvas`] implementation that writes a PDF document through `printpdf`.

use std::io::{BufWriter, Cursor};

use log::debug;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point,
};

use crate::canvas::{Canvas, FontWeight, Rect, Rgb, TextStyle};
use crate::error::{ReportError, Result};

/// Layout units per millimetre.
const UNITS_PER_MM: f64 = 10.0;
/// Distance from the top of a line of text to its baseline, as a fraction of the font size.
const ASCENT_RATIO: f64 = 0.8;
const MM_PER_POINT: f64 = 25.4 / 72.0;
const LAYER_NAME: &str = "Report";

fn mm(units: u32) -> Mm {
    Mm(f64::from(units) / UNITS_PER_MM)
}

fn pdf_color(color: Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(
        f64::from(color.0) / 255.0,
        f64::from(color.1) / 255.0,
        f64::from(color.2) / 255.0,
        None,
    ))
}

fn draw_error(err: impl std::fmt::Display) -> ReportError {
    ReportError::Draw(err.to_string())
}

struct OpenDocument {
    document: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Canvas backed by an in-memory `printpdf` document using the builtin
/// Helvetica faces, so no font files are needed.
pub struct PdfCanvas {
    title: String,
    open: Option<OpenDocument>,
    page_height: u32,
    pages: usize,
}

impl PdfCanvas {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            open: None,
            page_height: 0,
            pages: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    fn current(&self) -> Result<&OpenDocument> {
        self.open
            .as_ref()
            .ok_or_else(|| ReportError::Draw("drawing before the first page was added".into()))
    }

    /// Converts a top-based `y` to the PDF's bottom-based coordinate.
    fn flip(&self, y: u32) -> Mm {
        mm(self.page_height.saturating_sub(y))
    }
}

impl Canvas for PdfCanvas {
    fn add_page(&mut self, width: u32, height: u32) -> Result<()> {
        self.page_height = height;
        self.pages += 1;

        match &mut self.open {
            Some(open) => {
                let (page, layer) = open.document.add_page(mm(width), mm(height), LAYER_NAME);
                open.layer = open.document.get_page(page).get_layer(layer);
            }
            None => {
                let (document, page, layer) =
                    PdfDocument::new(self.title.as_str(), mm(width), mm(height), LAYER_NAME);
                let regular = document
                    .add_builtin_font(BuiltinFont::Helvetica)
                    .map_err(draw_error)?;
                let bold = document
                    .add_builtin_font(BuiltinFont::HelveticaBold)
                    .map_err(draw_error)?;
                let layer = document.get_page(page).get_layer(layer);
                self.open = Some(OpenDocument {
                    document,
                    layer,
                    regular,
                    bold,
                });
            }
        }
        debug!("pdf page {} ({}x{})", self.pages, width, height);
        Ok(())
    }

    fn draw_text(&mut self, x: u32, y: u32, style: &TextStyle, text: &str) -> Result<()> {
        let open = self.current()?;
        let font = match style.weight {
            FontWeight::Regular => &open.regular,
            FontWeight::Bold => &open.bold,
        };
        let ascent = f64::from(style.size) * MM_PER_POINT * ASCENT_RATIO;
        let baseline = Mm(self.flip(y).0 - ascent);

        open.layer.set_fill_color(pdf_color(style.color));
        open.layer
            .use_text(text, style.size.into(), mm(x), baseline, font);
        Ok(())
    }

    fn draw_rect(&mut self, rect: &Rect) -> Result<()> {
        if rect.fill.is_none() && rect.border.is_none() {
            return Ok(());
        }
        let open = self.current()?;
        let top = self.flip(rect.y);
        let bottom = self.flip(rect.y + rect.height);
        let left = mm(rect.x);
        let right = mm(rect.x + rect.width);

        if let Some(fill) = rect.fill {
            open.layer.set_fill_color(pdf_color(fill));
        }
        if let Some(border) = rect.border {
            open.layer.set_outline_color(pdf_color(border));
        }
        open.layer.add_shape(Line {
            points: vec![
                (Point::new(left, bottom), false),
                (Point::new(right, bottom), false),
                (Point::new(right, top), false),
                (Point::new(left, top), false),
            ],
            is_closed: true,
            has_fill: rect.fill.is_some(),
            has_stroke: rect.border.is_some(),
            is_clipping_path: false,
        });
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>> {
        let open = self
            .open
            .ok_or_else(|| ReportError::Draw("document has no pages".into()))?;
        let mut writer = BufWriter::new(Cursor::new(Vec::new()));
        open.document.save(&mut writer).map_err(draw_error)?;
        let bytes = writer
            .into_inner()
            .map_err(|err| ReportError::Io(err.into_error()))?
            .into_inner();
        debug!("serialized {} page(s), {} bytes", self.pages, bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawing_before_a_page_is_an_error() {
        let mut canvas = PdfCanvas::new("Test");
        let err = canvas
            .draw_text(0, 0, &TextStyle::regular(8), "orphan")
            .unwrap_err();
        assert!(matches!(err, ReportError::Draw(_)));
    }

    #[test]
    fn finishing_without_pages_is_an_error() {
        assert!(matches!(
            PdfCanvas::new("Test").finish(),
            Err(ReportError::Draw(_))
        ));
    }

    #[test]
    fn writes_a_pdf_document() {
        let mut canvas = PdfCanvas::new("Test");
        canvas.add_page(2970, 2100).unwrap();
        canvas
            .draw_rect(&Rect {
                x: 100,
                y: 100,
                width: 500,
                height: 70,
                fill: Some(Rgb(240, 240, 240)),
                border: Some(Rgb::GRAY),
            })
            .unwrap();
        canvas
            .draw_text(115, 110, &TextStyle::bold(8), "Hello")
            .unwrap();
        canvas.add_page(2970, 2100).unwrap();
        assert_eq!(canvas.page_count(), 2);

        let bytes = canvas.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
