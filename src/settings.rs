//! Report settings loaded from TOML or assembled with builder-style setters.
//!
//! All lengths are layout units: tenths of a millimetre.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::canvas::Rgb;
use crate::error::{ReportError, Result};

/// Longest page side accepted from a settings file (10 m).
pub const MAX_PAGE_LENGTH: u32 = 100_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSettings {
    #[serde(default)]
    pub page: PageSettings,
    #[serde(default)]
    pub table: TableSettings,
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub summary: SummarySettings,
    #[serde(default)]
    pub document: DocumentSettings,
}

impl ReportSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
            .map_err(|err| ReportError::Config(format!("{}: {}", path.display(), err)))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let settings: Self = toml::from_str(raw).map_err(|err| ReportError::Config(err.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects page geometry that leaves no room to draw or that would
    /// overflow the layout arithmetic.
    pub fn validate(&self) -> Result<()> {
        let page = &self.page;
        if page.width > MAX_PAGE_LENGTH || page.height > MAX_PAGE_LENGTH {
            return Err(ReportError::Config(format!(
                "page {}x{} exceeds {} units",
                page.width, page.height, MAX_PAGE_LENGTH
            )));
        }
        if self.usable_width() == 0 || self.usable_height() == 0 {
            return Err(ReportError::Config(format!(
                "margin {} leaves no usable area on a {}x{} page",
                page.margin, page.width, page.height
            )));
        }
        let table = &self.table;
        let tallest = [
            table.row_height,
            table.title_height,
            table.subtitle_height,
            table.header_row_height,
            self.summary.min_height,
        ]
        .into_iter()
        .max()
        .unwrap_or(0);
        if tallest > page.height {
            return Err(ReportError::Config(format!(
                "table height {} exceeds the page height {}",
                tallest, page.height
            )));
        }
        Ok(())
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, width: u32, height: u32) -> Self {
        self.page.width = width;
        self.page.height = height;
        self
    }

    /// Sets the uniform page margin.
    pub fn with_margin(mut self, margin: u32) -> Self {
        self.page.margin = margin;
        self
    }

    /// Sets the fixed table row height.
    pub fn with_row_height(mut self, row_height: u32) -> Self {
        self.table.row_height = row_height;
        self
    }

    /// Sets the space the summary section needs before it may start on a page.
    pub fn with_summary_min_height(mut self, height: u32) -> Self {
        self.summary.min_height = height;
        self
    }

    /// Sets the document title printed at the top of every page.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.document.title = title.into();
        self
    }

    /// Page width minus both margins.
    pub fn usable_width(&self) -> u32 {
        self.page.width.saturating_sub(self.page.margin.saturating_mul(2))
    }

    /// Page height minus both margins.
    pub fn usable_height(&self) -> u32 {
        self.page.height.saturating_sub(self.page.margin.saturating_mul(2))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSettings {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
}
impl Default for PageSettings {
    fn default() -> Self {
        // A4 landscape.
        Self {
            width: 2970,
            height: 2100,
            margin: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    pub row_height: u32,
    pub title_height: u32,
    pub subtitle_height: u32,
    pub header_row_height: u32,
    pub title_font_size: u8,
    pub subtitle_font_size: u8,
    pub header_font_size: u8,
    pub body_font_size: u8,
    pub cell_padding: u32,
    pub header_fill: Rgb,
    pub header_text: Rgb,
    pub zebra_fill: Rgb,
    pub group_fill: Rgb,
    pub border: Rgb,
}
impl Default for TableSettings {
    fn default() -> Self {
        Self {
            row_height: 70,
            title_height: 90,
            subtitle_height: 60,
            header_row_height: 80,
            title_font_size: 14,
            subtitle_font_size: 9,
            header_font_size: 8,
            body_font_size: 8,
            cell_padding: 15,
            header_fill: Rgb(41, 98, 155),
            header_text: Rgb(255, 255, 255),
            zebra_fill: Rgb(242, 245, 248),
            group_fill: Rgb(221, 232, 243),
            border: Rgb(200, 205, 210),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Identity column shares of the usable width in all-vaccines mode, in percent.
    pub name_share: u32,
    pub gender_share: u32,
    pub locality_share: u32,
    /// Share of the usable width given to the name column in monthly mode, in percent.
    pub monthly_name_share: u32,
    /// Share of the usable width given to the vaccine column in monthly mode, in percent.
    pub monthly_vaccine_share: u32,
    pub min_vaccine_column_width: u32,
    pub abbreviation_threshold: usize,
}
impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            name_share: 20,
            gender_share: 6,
            locality_share: 12,
            monthly_name_share: 40,
            monthly_vaccine_share: 35,
            min_vaccine_column_width: 80,
            abbreviation_threshold: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    /// Space that must remain below the table for the summary to start on the same page.
    pub min_height: u32,
    /// More vaccines than this are laid out in two columns.
    pub two_column_threshold: usize,
    pub line_height: u32,
    pub heading_font_size: u8,
    pub font_size: u8,
}
impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            min_height: 400,
            two_column_threshold: 5,
            line_height: 55,
            heading_font_size: 11,
            font_size: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    pub title: String,
    pub facility: Option<String>,
}
impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            title: "Immunization Coverage Report".into(),
            facility: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let settings = ReportSettings::from_toml(
            r#"
            [page]
            width = 1000
            height = 1400
            margin = 50

            [document]
            title = "Barangay Coverage"
            "#,
        )
        .unwrap();

        assert_eq!(settings.usable_width(), 900);
        assert_eq!(settings.usable_height(), 1300);
        assert_eq!(settings.document.title, "Barangay Coverage");
        assert_eq!(settings.table, TableSettings::default());
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = ReportSettings::from_toml("[page]\nwidth = \"wide\"").unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[test]
    fn huge_margin_does_not_overflow() {
        let settings = ReportSettings::default().with_margin(u32::MAX);
        assert_eq!(settings.usable_width(), 0);
        assert_eq!(settings.usable_height(), 0);
    }

    #[test]
    fn rejects_geometry_without_usable_area() {
        let err = ReportSettings::from_toml("[page]\nmargin = 4294967295\n").unwrap_err();
        assert!(matches!(err, ReportError::Config(ref msg) if msg.contains("no usable area")));

        let err = ReportSettings::from_toml("[page]\nwidth = 4294967295\n").unwrap_err();
        assert!(matches!(err, ReportError::Config(ref msg) if msg.contains("exceeds")));

        let err = ReportSettings::from_toml("[table]\nrow_height = 4000000000\n").unwrap_err();
        assert!(matches!(err, ReportError::Config(ref msg) if msg.contains("page height")));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.toml");
        std::fs::write(&path, "[table]\nrow_height = 90\n").unwrap();

        let settings = ReportSettings::load(&path).unwrap();
        assert_eq!(settings.table.row_height, 90);
        assert_eq!(settings.page, PageSettings::default());
    }
}
