//! `genpdf` document setup for the compliance sheet.

use genpdf::elements::Paragraph;
use genpdf::error::{Error, ErrorKind};
use genpdf::style::Style;
use genpdf::{Alignment, Element, Margins, Mm, PageDecorator, Position, Size};

use crate::error::Result;
use crate::fonts;

/// Font size of the running header and footer lines.
const LABEL_SIZE: u8 = 7;

/// Vertical space kept free for the footer line.
const FOOTER_HEIGHT: f64 = 8.0;

/// Builder for `genpdf::Document`s with a running header and footer line.
#[derive(Default)]
pub struct SheetBuilder {
    title: Option<String>,
    paper_size: Option<Size>,
    margins: Option<Margins>,
    font_size: Option<u8>,
    header: Option<String>,
    footer: Option<String>,
}

impl SheetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_paper_size(mut self, paper_size: impl Into<Size>) -> Self {
        self.paper_size = Some(paper_size.into());
        self
    }

    pub fn with_margins(mut self, margins: impl Into<Margins>) -> Self {
        self.margins = Some(margins.into());
        self
    }

    pub fn with_font_size(mut self, font_size: u8) -> Self {
        self.font_size = Some(font_size);
        self
    }

    /// Right-aligned header line; the page number is appended per page.
    pub fn with_header(mut self, text: impl Into<String>) -> Self {
        self.header = Some(text.into());
        self
    }

    /// Centered footer line at the bottom of every page.
    pub fn with_footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }

    /// Loads the fonts and builds the document.
    pub fn build(self) -> Result<genpdf::Document> {
        let font_family = fonts::default_font_family()?;
        let mut document = genpdf::Document::new(font_family);

        if let Some(title) = &self.title {
            document.set_title(title.clone());
        }
        if let Some(paper_size) = self.paper_size {
            document.set_paper_size(paper_size);
        }
        if let Some(font_size) = self.font_size {
            document.set_font_size(font_size);
        }
        document.set_page_decorator(self.into_decorator());
        Ok(document)
    }

    fn into_decorator(self) -> SheetDecorator {
        SheetDecorator {
            page: 0,
            margins: self.margins,
            header: self.header,
            footer: self.footer,
        }
    }
}

/// Draws the running header and footer lines and shrinks the body area.
struct SheetDecorator {
    page: usize,
    margins: Option<Margins>,
    header: Option<String>,
    footer: Option<String>,
}

impl SheetDecorator {
    fn header_line(&self) -> Option<String> {
        self.header
            .as_ref()
            .map(|text| format!("{}  |  page {}", text, self.page))
    }

    fn label(text: String, alignment: Alignment) -> impl Element {
        Paragraph::new(text)
            .aligned(alignment)
            .styled(Style::new().with_font_size(LABEL_SIZE))
    }
}

impl PageDecorator for SheetDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: Style,
    ) -> std::result::Result<genpdf::render::Area<'a>, Error> {
        self.page += 1;
        if let Some(margins) = self.margins {
            area.add_margins(margins);
        }

        if let Some(line) = self.header_line() {
            let rendered = Self::label(line, Alignment::Right).render(context, area.clone(), style)?;
            area.add_offset(Position::new(0, rendered.size.height));
        }

        if let Some(text) = &self.footer {
            let reserved = Mm::from(FOOTER_HEIGHT);
            let body_height = area.size().height;
            if reserved > body_height {
                return Err(Error::new(
                    "page too short for the footer line",
                    ErrorKind::InvalidData,
                ));
            }
            let mut footer_area = area.clone();
            footer_area.add_offset(Position::new(0, body_height - reserved));
            let rendered =
                Self::label(text.clone(), Alignment::Center).render(context, footer_area, style)?;
            if rendered.has_more {
                return Err(Error::new(
                    "footer line wraps past its reserved space",
                    ErrorKind::PageSizeExceeded,
                ));
            }
            area.set_height(body_height - reserved);
        }

        Ok(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_line_carries_the_page_number() {
        let mut decorator = SheetBuilder::new()
            .with_header("Dose timing: Maria Santos")
            .with_footer("Generated Mar 10, 2024")
            .into_decorator();
        decorator.page = 2;
        assert_eq!(
            decorator.header_line().as_deref(),
            Some("Dose timing: Maria Santos  |  page 2")
        );
        assert_eq!(decorator.footer.as_deref(), Some("Generated Mar 10, 2024"));
    }

    #[test]
    fn decorator_without_header_has_no_header_line() {
        let decorator = SheetBuilder::new().into_decorator();
        assert_eq!(decorator.header_line(), None);
        assert_eq!(decorator.page, 0);
    }
}
