//! Page breaking for the coverage table.
//!
//! The [`Paginator`] owns the canvas for the duration of a report.  It
//! draws the page title and the column header row, emits fixed-height rows,
//! and starts a new page (title suffixed with ` (Continued)`, header row
//! repeated) whenever the next row no longer fits.  Zebra striping follows
//! the row's position on the current page, so the first row of every page
//! is always unshaded.

use log::debug;

use crate::canvas::{Canvas, Rect, Rgb, TextStyle};
use crate::error::Result;
use crate::format::fit_text;
use crate::layout::ColumnPlan;
use crate::settings::ReportSettings;

/// Suffix appended to the title of every page that continues a table or section.
pub const CONTINUED_SUFFIX: &str = " (Continued)";

/// Where the paginator is in the lifecycle of the current page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageState {
    PageStart,
    HeaderDrawn,
    RowsEmitting,
    PageFull,
    Done,
}

/// A named position in the document, used for the PDF outline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Landmark {
    pub title: String,
    /// 1-based page number.
    pub page: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaginationStats {
    pub pages: usize,
    /// Table rows emitted, group headings included.
    pub rows: usize,
}

/// Everything the paginator produced once the document is closed.
#[derive(Debug)]
pub struct PaginatedDocument {
    pub bytes: Vec<u8>,
    pub stats: PaginationStats,
    pub landmarks: Vec<Landmark>,
}

pub struct Paginator<'s, C: Canvas> {
    canvas: C,
    settings: &'s ReportSettings,
    title: String,
    subtitle: String,
    plan: Option<ColumnPlan>,
    caption: Option<String>,
    state: PageState,
    cursor: u32,
    page_rows: usize,
    stats: PaginationStats,
    landmarks: Vec<Landmark>,
}

impl<'s, C: Canvas> Paginator<'s, C> {
    pub fn new(
        canvas: C,
        settings: &'s ReportSettings,
        title: impl Into<String>,
        subtitle: impl Into<String>,
    ) -> Self {
        Self {
            canvas,
            settings,
            title: title.into(),
            subtitle: subtitle.into(),
            plan: None,
            caption: None,
            state: PageState::PageStart,
            cursor: settings.page.margin,
            page_rows: 0,
            stats: PaginationStats::default(),
            landmarks: Vec::new(),
        }
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    pub fn stats(&self) -> PaginationStats {
        self.stats
    }

    pub fn settings(&self) -> &'s ReportSettings {
        self.settings
    }

    /// Left edge of the usable area.
    pub fn left(&self) -> u32 {
        self.settings.page.margin
    }

    pub fn content_width(&self) -> u32 {
        self.settings.usable_width()
    }

    /// Vertical space left on the current page.
    pub fn remaining(&self) -> u32 {
        let bottom = self
            .settings
            .page
            .height
            .saturating_sub(self.settings.page.margin);
        bottom.saturating_sub(self.cursor)
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    /// Records a named position on the current page.
    pub fn mark(&mut self, title: impl Into<String>) {
        self.landmarks.push(Landmark {
            title: title.into(),
            page: self.stats.pages,
        });
    }

    /// Starts a table on a fresh page.  `caption` is appended to the page
    /// title and recorded as a landmark.
    pub fn start_table(&mut self, plan: ColumnPlan, caption: Option<String>) -> Result<()> {
        self.plan = Some(plan);
        self.caption = caption;
        self.start_page(false)?;
        if let Some(caption) = self.caption.clone() {
            self.mark(caption);
        }
        Ok(())
    }

    /// Emits a body row, breaking the page first when it does not fit.
    pub fn emit_row(&mut self, cells: &[String]) -> Result<()> {
        let settings = self.settings;
        self.ensure_row_space(settings.table.row_height)?;

        let table = &settings.table;
        let fill = (self.page_rows % 2 == 1).then_some(table.zebra_fill);
        let style = TextStyle::regular(table.body_font_size);
        self.draw_row(cells, fill, style)
    }

    /// Emits a full-width group heading row and records it as a landmark.
    /// The heading is kept on the same page as the row that follows it.
    pub fn emit_group(&mut self, label: &str) -> Result<()> {
        let settings = self.settings;
        let table = &settings.table;
        let row_height = table.row_height;
        self.ensure_row_space(row_height.saturating_mul(2))?;

        let y = self.cursor;
        let width = self.content_width();
        self.canvas.draw_rect(&Rect {
            x: self.left(),
            y,
            width,
            height: row_height,
            fill: Some(table.group_fill),
            border: Some(table.border),
        })?;
        let font_size = table.body_font_size;
        let text = fit_text(label, width.saturating_sub(2 * table.cell_padding), font_size);
        self.canvas.draw_text(
            self.left() + table.cell_padding,
            y + text_top(row_height, font_size),
            &TextStyle::bold(font_size),
            &text,
        )?;
        self.advance_row(row_height);
        self.mark(label);
        Ok(())
    }

    /// Leaves the table and makes sure `min_height` is available for a
    /// closing section, breaking the page when it is not.
    pub fn reserve_section(&mut self, name: &str, min_height: u32) -> Result<()> {
        self.plan = None;
        self.caption = None;
        if self.stats.pages == 0 || self.remaining() < min_height {
            debug!(
                "{} needs {} but only {} remains on page {}",
                name,
                min_height,
                self.remaining(),
                self.stats.pages
            );
            self.state = PageState::PageFull;
            self.start_page(self.stats.pages > 0)?;
        }
        self.mark(name);
        Ok(())
    }

    /// Claims `height` for free-form content and returns its top `y`,
    /// continuing on a new page when the current one is full.
    pub fn claim(&mut self, height: u32) -> Result<u32> {
        if self.stats.pages == 0 || self.remaining() < height {
            self.state = PageState::PageFull;
            self.start_page(self.stats.pages > 0)?;
        }
        let y = self.cursor;
        self.cursor += height;
        Ok(y)
    }

    /// Closes the document and hands back the serialized bytes.
    pub fn finish(mut self) -> Result<PaginatedDocument> {
        if self.stats.pages == 0 {
            self.start_page(false)?;
        }
        self.state = PageState::Done;
        debug!(
            "paginated {} row(s) over {} page(s)",
            self.stats.rows, self.stats.pages
        );
        let stats = self.stats;
        let landmarks = std::mem::take(&mut self.landmarks);
        let bytes = self.canvas.finish()?;
        Ok(PaginatedDocument {
            bytes,
            stats,
            landmarks,
        })
    }

    fn ensure_row_space(&mut self, needed: u32) -> Result<()> {
        if self.stats.pages == 0 {
            self.start_page(false)?;
        } else if self.page_rows > 0 && self.remaining() < needed {
            self.state = PageState::PageFull;
            debug!(
                "page {} full after {} row(s)",
                self.stats.pages, self.page_rows
            );
            self.start_page(true)?;
        }
        Ok(())
    }

    fn start_page(&mut self, continued: bool) -> Result<()> {
        let settings = self.settings;
        let page = &settings.page;
        let table = &settings.table;
        self.canvas.add_page(page.width, page.height)?;
        self.stats.pages += 1;
        self.state = PageState::PageStart;
        self.page_rows = 0;
        self.cursor = page.margin;

        let mut title = self.title.clone();
        if let Some(caption) = &self.caption {
            title.push_str(" - ");
            title.push_str(caption);
        }
        if continued {
            title.push_str(CONTINUED_SUFFIX);
        }
        self.canvas.draw_text(
            self.left(),
            self.cursor,
            &TextStyle::bold(table.title_font_size),
            &title,
        )?;
        self.cursor += table.title_height;

        if !self.subtitle.is_empty() {
            self.canvas.draw_text(
                self.left(),
                self.cursor,
                &TextStyle::regular(table.subtitle_font_size).with_color(Rgb::GRAY),
                &self.subtitle,
            )?;
            self.cursor += table.subtitle_height;
        }

        if self.plan.is_some() {
            self.draw_header_row()?;
            self.state = PageState::HeaderDrawn;
        }
        Ok(())
    }

    fn draw_header_row(&mut self) -> Result<()> {
        let Some(plan) = &self.plan else {
            return Ok(());
        };
        let table = &self.settings.table;
        let height = table.header_row_height;
        let y = self.cursor;
        self.canvas.draw_rect(&Rect {
            x: self.left(),
            y,
            width: plan.total_width(),
            height,
            fill: Some(table.header_fill),
            border: Some(table.border),
        })?;

        let style = TextStyle::bold(table.header_font_size).with_color(table.header_text);
        for (column, offset) in plan.columns.iter().zip(plan.offsets()) {
            let text = fit_text(
                &column.header,
                column.width.saturating_sub(2 * table.cell_padding),
                table.header_font_size,
            );
            self.canvas.draw_text(
                self.left() + offset + table.cell_padding,
                y + text_top(height, table.header_font_size),
                &style,
                &text,
            )?;
        }
        self.cursor += height;
        Ok(())
    }

    fn draw_row(&mut self, cells: &[String], fill: Option<Rgb>, style: TextStyle) -> Result<()> {
        let Some(plan) = &self.plan else {
            return Ok(());
        };
        let table = &self.settings.table;
        let height = table.row_height;
        let y = self.cursor;
        self.canvas.draw_rect(&Rect {
            x: self.left(),
            y,
            width: plan.total_width(),
            height,
            fill,
            border: Some(table.border),
        })?;

        for ((column, offset), cell) in plan.columns.iter().zip(plan.offsets()).zip(cells) {
            let text = fit_text(
                cell,
                column.width.saturating_sub(2 * table.cell_padding),
                style.size,
            );
            if text.is_empty() {
                continue;
            }
            self.canvas.draw_text(
                self.left() + offset + table.cell_padding,
                y + text_top(height, style.size),
                &style,
                &text,
            )?;
        }
        self.advance_row(height);
        Ok(())
    }

    fn advance_row(&mut self, height: u32) {
        self.cursor += height;
        self.page_rows += 1;
        self.stats.rows += 1;
        self.state = PageState::RowsEmitting;
    }
}

/// Top offset that vertically centers a line of `font_size` text in a row.
fn text_top(row_height: u32, font_size: u8) -> u32 {
    // One point is about 3.5 layout units.
    let line = u32::from(font_size) * 35 / 10;
    row_height.saturating_sub(line) / 2
}
