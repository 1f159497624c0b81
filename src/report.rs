//! Coverage report generation: filtering, row building and pagination.

use std::collections::BTreeMap;

use log::info;
use time::{Date, OffsetDateTime};

use crate::canvas::Canvas;
use crate::error::Result;
use crate::format::{dose_label, format_date, format_iso_date, format_month, format_percentage};
use crate::layout::{ordered_vaccines, plan_columns, ColumnKind, ColumnPlan};
use crate::model::{Gender, Infant, ReportMode, Vaccine, YearMonth};
use crate::paginate::{Landmark, Paginator};
use crate::pdf::PdfCanvas;
use crate::settings::ReportSettings;
use crate::source::InfantSource;
use crate::summary::{draw_summary, summarize, vaccine_stats, VaccineStat, VaccineSummary};

/// Cell shown for a vaccine the infant has no schedule entry for.
const MISSING_CELL: &str = "-";

/// Narrows the infants and vaccines a report covers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub vaccine: Option<String>,
    pub baranggay: Option<String>,
    pub gender: Option<Gender>,
    /// Month of administration; only used in monthly mode.
    pub month: Option<YearMonth>,
}

impl ReportFilter {
    pub fn with_vaccine(mut self, vaccine: impl Into<String>) -> Self {
        self.vaccine = Some(vaccine.into());
        self
    }

    pub fn with_baranggay(mut self, baranggay: impl Into<String>) -> Self {
        self.baranggay = Some(baranggay.into());
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_month(mut self, month: YearMonth) -> Self {
        self.month = Some(month);
        self
    }

    pub fn matches_infant(&self, infant: &Infant) -> bool {
        let baranggay = self.baranggay.as_deref().map_or(true, |wanted| {
            infant.address.baranggay.trim().eq_ignore_ascii_case(wanted.trim())
        });
        let gender = self
            .gender
            .as_ref()
            .map_or(true, |wanted| &infant.gender == wanted);
        baranggay && gender
    }

    pub fn matches_vaccine(&self, vaccine: &Vaccine) -> bool {
        self.vaccine
            .as_deref()
            .map_or(true, |wanted| vaccine.name.eq_ignore_ascii_case(wanted.trim()))
    }

    fn describe(&self, mode: ReportMode) -> Vec<String> {
        let mut parts = Vec::new();
        if let Some(vaccine) = &self.vaccine {
            parts.push(format!("Vaccine: {}", vaccine));
        }
        if let Some(baranggay) = &self.baranggay {
            parts.push(format!("Baranggay: {}", baranggay));
        }
        if let Some(gender) = &self.gender {
            parts.push(format!("Sex: {}", gender));
        }
        if let (ReportMode::Monthly, Some(month)) = (mode, self.month) {
            parts.push(format!("Month: {}", format_month(month)));
        }
        parts
    }
}

/// What to generate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportRequest {
    pub mode: ReportMode,
    pub filter: ReportFilter,
    /// Date printed on the report and used in its file name.
    pub generated_on: Date,
    /// Overrides the configured document title.
    pub title: Option<String>,
}

impl ReportRequest {
    /// Creates a request dated today (UTC).
    pub fn new(mode: ReportMode) -> Self {
        Self {
            mode,
            filter: ReportFilter::default(),
            generated_on: OffsetDateTime::now_utc().date(),
            title: None,
        }
    }

    pub fn with_filter(mut self, filter: ReportFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_date(mut self, date: Date) -> Self {
        self.generated_on = date;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A generated report ready to be saved.
#[derive(Debug)]
pub struct RenderedReport {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub pages: usize,
    /// Table rows drawn, month headings included.
    pub rows: usize,
    pub landmarks: Vec<Landmark>,
    pub summaries: Vec<VaccineSummary>,
    /// Spread of recorded completion percentages, in summary order.
    pub stats: Vec<VaccineStat>,
}

/// Console figures for the filtered infants.
#[derive(Clone, Debug, PartialEq)]
pub struct CoverageSummary {
    pub infants: usize,
    pub summaries: Vec<VaccineSummary>,
    pub stats: Vec<VaccineStat>,
}

/// `vaccination-report-<mode>-<YYYY-MM-DD>.pdf`
pub fn report_file_name(mode: ReportMode, date: Date) -> String {
    format!("vaccination-report-{}-{}.pdf", mode.slug(), format_iso_date(date))
}

/// Infants matching `filter`, ordered by name.
pub fn select_infants<'a>(infants: &'a [Infant], filter: &ReportFilter) -> Vec<&'a Infant> {
    let mut selected: Vec<&Infant> = infants
        .iter()
        .filter(|infant| filter.matches_infant(infant))
        .collect();
    selected.sort_by_cached_key(|infant| infant.full_name.to_lowercase());
    selected
}

/// Vaccines the report shows, in display order.
pub fn report_vaccines(infants: &[&Infant], filter: &ReportFilter) -> Vec<Vaccine> {
    ordered_vaccines(infants.iter().copied())
        .into_iter()
        .filter(|vaccine| filter.matches_vaccine(vaccine))
        .collect()
}

/// One administered dose in a monthly report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DoseRow {
    pub infant: String,
    pub vaccine: String,
    pub dose: u8,
    pub administered: Date,
}

/// Administered doses grouped by month of administration, oldest month
/// first, each group ordered by date and then name.
pub fn monthly_groups(
    infants: &[&Infant],
    vaccines: &[Vaccine],
    month: Option<YearMonth>,
) -> BTreeMap<YearMonth, Vec<DoseRow>> {
    let mut groups: BTreeMap<YearMonth, Vec<DoseRow>> = BTreeMap::new();
    for infant in infants {
        for schedule in &infant.schedules {
            if !vaccines
                .iter()
                .any(|vaccine| vaccine.name.eq_ignore_ascii_case(&schedule.vaccine.name))
            {
                continue;
            }
            for (dose, administered) in schedule.administered_doses() {
                if month.map_or(false, |wanted| !wanted.contains(administered)) {
                    continue;
                }
                groups
                    .entry(YearMonth::of(administered))
                    .or_default()
                    .push(DoseRow {
                        infant: infant.full_name.clone(),
                        vaccine: schedule.vaccine.name.clone(),
                        dose,
                        administered,
                    });
            }
        }
    }
    for rows in groups.values_mut() {
        rows.sort_by(|a, b| {
            a.administered
                .cmp(&b.administered)
                .then_with(|| a.infant.to_lowercase().cmp(&b.infant.to_lowercase()))
        });
    }
    groups
}

fn infant_cells(infant: &Infant, plan: &ColumnPlan, vaccines: &[Vaccine]) -> Vec<String> {
    plan.columns
        .iter()
        .map(|column| match column.kind {
            ColumnKind::Name => infant.full_name.clone(),
            ColumnKind::Gender => infant.gender.short_label(),
            ColumnKind::Locality => infant.address.baranggay.clone(),
            ColumnKind::Vaccine(index) => infant
                .schedule_for(&vaccines[index].name)
                .map(|schedule| format_percentage(schedule.percentage))
                .unwrap_or_else(|| MISSING_CELL.to_string()),
            ColumnKind::Dose | ColumnKind::Date => String::new(),
        })
        .collect()
}

fn dose_cells(row: &DoseRow) -> Vec<String> {
    vec![
        row.infant.clone(),
        format!("{} ({})", row.vaccine, dose_label(row.dose)),
        format_date(row.administered),
    ]
}

fn subtitle(request: &ReportRequest, settings: &ReportSettings, infant_count: usize) -> String {
    let mut parts = vec![format!("Generated {}", format_date(request.generated_on))];
    if let Some(facility) = &settings.document.facility {
        parts.push(facility.clone());
    }
    parts.push(format!("{} infant(s)", infant_count));
    parts.extend(request.filter.describe(request.mode));
    parts.join("  |  ")
}

/// Fetches the records, lays out and paginates the report on `canvas`.
///
/// Nothing is drawn when fetching fails.  Any drawing failure aborts the
/// run and no bytes are returned.
pub fn generate_report<S, C>(
    source: &S,
    request: &ReportRequest,
    settings: &ReportSettings,
    canvas: C,
) -> Result<RenderedReport>
where
    S: InfantSource + ?Sized,
    C: Canvas,
{
    let infants = source.fetch_all_infants()?;
    let selected = select_infants(&infants, &request.filter);
    let vaccines = report_vaccines(&selected, &request.filter);
    let vaccine_names: Vec<String> = vaccines.iter().map(|v| v.name.clone()).collect();

    let title = request
        .title
        .clone()
        .unwrap_or_else(|| settings.document.title.clone());
    let mut paginator = Paginator::new(
        canvas,
        settings,
        title,
        subtitle(request, settings, selected.len()),
    );

    let layout = plan_columns(
        settings.usable_width(),
        request.mode,
        &vaccine_names,
        &settings.layout,
    );

    match request.mode {
        ReportMode::All => {
            let band_count = layout.band_count();
            for plan in layout.bands {
                let caption = (band_count > 1).then(|| {
                    format!(
                        "Vaccines {}-{} of {}",
                        plan.vaccines.start + 1,
                        plan.vaccines.end,
                        vaccines.len()
                    )
                });
                let rows: Vec<Vec<String>> = selected
                    .iter()
                    .map(|infant| infant_cells(infant, &plan, &vaccines))
                    .collect();
                paginator.start_table(plan, caption)?;
                for cells in &rows {
                    paginator.emit_row(cells)?;
                }
            }
        }
        ReportMode::Monthly => {
            let groups = monthly_groups(&selected, &vaccines, request.filter.month);
            if let Some(plan) = layout.bands.into_iter().next() {
                paginator.start_table(plan, None)?;
            }
            for (month, rows) in &groups {
                paginator.emit_group(&format_month(*month))?;
                for row in rows {
                    paginator.emit_row(&dose_cells(row))?;
                }
            }
        }
    }

    let summaries = summarize(&selected, &vaccines);
    let stats = vaccine_stats(&selected, &vaccines);
    draw_summary(&mut paginator, &summaries, selected.len())?;
    let document = paginator.finish()?;

    let file_name = report_file_name(request.mode, request.generated_on);
    info!(
        "generated {} ({} page(s), {} row(s), {} infant(s))",
        file_name,
        document.stats.pages,
        document.stats.rows,
        selected.len()
    );

    Ok(RenderedReport {
        file_name,
        bytes: document.bytes,
        pages: document.stats.pages,
        rows: document.stats.rows,
        landmarks: document.landmarks,
        summaries,
        stats,
    })
}

/// Generates the report as a PDF document.
pub fn render_pdf<S>(
    source: &S,
    request: &ReportRequest,
    settings: &ReportSettings,
) -> Result<RenderedReport>
where
    S: InfantSource + ?Sized,
{
    let title = request
        .title
        .clone()
        .unwrap_or_else(|| settings.document.title.clone());
    #[allow(unused_mut)]
    let mut report = generate_report(source, request, settings, PdfCanvas::new(title))?;

    #[cfg(feature = "bookmarks")]
    {
        report.bytes = crate::bookmarks::apply_landmark_bookmarks(&report.bytes, &report.landmarks)?;
    }

    Ok(report)
}

/// Summary figures for the filtered infants without rendering anything.
pub fn coverage_summary<S>(source: &S, filter: &ReportFilter) -> Result<CoverageSummary>
where
    S: InfantSource + ?Sized,
{
    let infants = source.fetch_all_infants()?;
    let selected = select_infants(&infants, filter);
    let vaccines = report_vaccines(&selected, filter);
    Ok(CoverageSummary {
        infants: selected.len(),
        summaries: summarize(&selected, &vaccines),
        stats: vaccine_stats(&selected, &vaccines),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Address, DoseSlot, VaccinationSchedule};
    use time::macros::date;
    use time::Month;

    fn schedule(name: &str, sort: i32, administered: &[Date], percentage: u8) -> VaccinationSchedule {
        let mut doses = [DoseSlot::default(); 3];
        for (slot, date) in doses.iter_mut().zip(administered) {
            slot.scheduled = Some(*date);
            slot.administered = Some(*date);
        }
        VaccinationSchedule {
            vaccine: Vaccine {
                id: name.into(),
                name: name.into(),
                sort,
                frequency: 3,
            },
            doses,
            percentage,
        }
    }

    fn infant(name: &str, baranggay: &str, schedules: Vec<VaccinationSchedule>) -> Infant {
        Infant {
            id: name.to_lowercase(),
            full_name: name.into(),
            gender: Gender::Male,
            address: Address {
                baranggay: baranggay.into(),
                ..Address::default()
            },
            schedules,
        }
    }

    #[test]
    fn file_name_is_deterministic() {
        assert_eq!(
            report_file_name(ReportMode::Monthly, date!(2024 - 03 - 05)),
            "vaccination-report-monthly-2024-03-05.pdf"
        );
        assert_eq!(
            report_file_name(ReportMode::All, date!(2024 - 12 - 31)),
            "vaccination-report-all-2024-12-31.pdf"
        );
    }

    #[test]
    fn selection_filters_and_sorts_by_name() {
        let infants = vec![
            infant("Zed", "Poblacion", vec![]),
            infant("amy", "poblacion", vec![]),
            infant("Bob", "San Isidro", vec![]),
        ];
        let filter = ReportFilter::default().with_baranggay("Poblacion");
        let names: Vec<_> = select_infants(&infants, &filter)
            .iter()
            .map(|i| i.full_name.as_str())
            .collect();
        assert_eq!(names, vec!["amy", "Zed"]);
    }

    #[test]
    fn vaccines_follow_sort_rank_and_filter() {
        let infants = vec![
            infant("A", "X", vec![schedule("OPV", 2, &[], 0), schedule("BCG", 1, &[], 0)]),
            infant("B", "X", vec![schedule("MMR", 2, &[], 0)]),
        ];
        let refs: Vec<&Infant> = infants.iter().collect();

        let all: Vec<_> = report_vaccines(&refs, &ReportFilter::default())
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(all, vec!["BCG", "OPV", "MMR"]);

        let only = report_vaccines(&refs, &ReportFilter::default().with_vaccine("mmr"));
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].name, "MMR");
    }

    #[test]
    fn monthly_groups_are_chronological() {
        let infants = vec![
            infant(
                "Bea",
                "X",
                vec![schedule("OPV", 1, &[date!(2024 - 02 - 10), date!(2024 - 01 - 05)], 67)],
            ),
            infant("Al", "X", vec![schedule("OPV", 1, &[date!(2024 - 01 - 05)], 33)]),
        ];
        let refs: Vec<&Infant> = infants.iter().collect();
        let vaccines = report_vaccines(&refs, &ReportFilter::default());

        let groups = monthly_groups(&refs, &vaccines, None);
        let months: Vec<_> = groups.keys().copied().collect();
        assert_eq!(
            months,
            vec![YearMonth::new(2024, Month::January), YearMonth::new(2024, Month::February)]
        );
        let january = &groups[&YearMonth::new(2024, Month::January)];
        assert_eq!(january[0].infant, "Al");
        assert_eq!(january[1].infant, "Bea");
        assert_eq!(january[1].dose, 2);

        let february_only =
            monthly_groups(&refs, &vaccines, Some(YearMonth::new(2024, Month::February)));
        assert_eq!(february_only.len(), 1);
    }

    #[test]
    fn missing_schedule_renders_placeholder() {
        let infants = vec![infant("A", "X", vec![schedule("BCG", 1, &[], 100)])];
        let vaccines = vec![
            infants[0].schedules[0].vaccine.clone(),
            Vaccine {
                id: "opv".into(),
                name: "OPV".into(),
                sort: 2,
                frequency: 1,
            },
        ];
        let names: Vec<String> = vaccines.iter().map(|v| v.name.clone()).collect();
        let layout = plan_columns(2770, ReportMode::All, &names, &Default::default());
        let cells = infant_cells(&infants[0], &layout.bands[0], &vaccines);
        assert_eq!(cells, vec!["A", "M", "X", "100%", "-"]);
    }
}
