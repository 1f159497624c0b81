//! Immunization coverage reports for pediatric vaccination records.
//!
//! The coverage report is a paginated landscape table (one row per infant
//! and a completion column per vaccine, or one row per administered dose
//! grouped by month) followed by a per-vaccine summary.  Drawing goes
//! through the [`canvas::Canvas`] trait so the same layout can be recorded
//! in tests or written to PDF by [`pdf::PdfCanvas`].  A per-infant dose
//! timing analysis can additionally be rendered as a compliance sheet.

pub mod builder;
pub mod canvas;
pub mod error;
pub mod fonts;
pub mod format;
pub mod layout;
pub mod model;
pub mod paginate;
pub mod pdf;
pub mod report;
pub mod settings;
pub mod sheet;
pub mod source;
pub mod summary;
pub mod timing;

#[cfg(feature = "bookmarks")]
pub mod bookmarks;

pub use canvas::{Canvas, RecordingCanvas};
pub use error::{ReportError, Result};
pub use model::{Gender, Infant, ReportMode, YearMonth};
pub use report::{
    coverage_summary, generate_report, render_pdf, report_file_name, CoverageSummary,
    RenderedReport, ReportFilter, ReportRequest,
};
pub use settings::ReportSettings;
pub use source::{InfantSource, JsonFileSource, StaticSource};
