//! Per-vaccine completion statistics and the summary section drawn after the table.

use crate::canvas::{Canvas, TextStyle};
use crate::error::Result;
use crate::format::{abbreviate_vaccine_name, fit_text};
use crate::model::{Infant, Vaccine};
use crate::paginate::Paginator;

/// Title of the summary section, also used as its outline entry.
pub const SUMMARY_TITLE: &str = "Vaccination Summary";

/// Completion breakdown of one vaccine across the filtered infants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VaccineSummary {
    pub vaccine: String,
    pub total: usize,
    pub complete: usize,
    pub in_progress: usize,
    pub not_started: usize,
    pub complete_percentage: u32,
    pub in_progress_percentage: u32,
    pub not_started_percentage: u32,
}

/// Spread of completion percentages observed for one vaccine.
#[derive(Clone, Debug, PartialEq)]
pub struct VaccineStat {
    pub vaccine: String,
    pub percentages: Vec<u8>,
    pub min: u8,
    pub max: u8,
    pub average: f64,
}

/// `count / total` as a whole percentage, rounding halves up.  An empty
/// total yields 0.
pub fn percent_of(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let count = count as u64;
    let total = total as u64;
    ((200 * count + total) / (2 * total)) as u32
}

fn completion(infant: &Infant, vaccine: &Vaccine) -> u8 {
    infant
        .schedule_for(&vaccine.name)
        .map(|schedule| schedule.percentage)
        .unwrap_or(0)
}

/// Summarizes every vaccine over `infants`.  An infant without a schedule
/// entry for a vaccine counts as not started.
pub fn summarize(infants: &[&Infant], vaccines: &[Vaccine]) -> Vec<VaccineSummary> {
    vaccines
        .iter()
        .map(|vaccine| {
            let total = infants.len();
            let mut complete = 0;
            let mut not_started = 0;
            for infant in infants {
                match completion(infant, vaccine) {
                    0 => not_started += 1,
                    100 => complete += 1,
                    _ => {}
                }
            }
            let in_progress = total - complete - not_started;

            VaccineSummary {
                vaccine: vaccine.name.clone(),
                total,
                complete,
                in_progress,
                not_started,
                complete_percentage: percent_of(complete, total),
                in_progress_percentage: percent_of(in_progress, total),
                not_started_percentage: percent_of(not_started, total),
            }
        })
        .collect()
}

/// Collects the observed completion percentages per vaccine.  Infants
/// without an entry for the vaccine are skipped.
pub fn vaccine_stats(infants: &[&Infant], vaccines: &[Vaccine]) -> Vec<VaccineStat> {
    vaccines
        .iter()
        .map(|vaccine| {
            let percentages: Vec<u8> = infants
                .iter()
                .filter_map(|infant| infant.schedule_for(&vaccine.name))
                .map(|schedule| schedule.percentage)
                .collect();
            let min = percentages.iter().copied().min().unwrap_or(0);
            let max = percentages.iter().copied().max().unwrap_or(0);
            let average = if percentages.is_empty() {
                0.0
            } else {
                percentages.iter().map(|p| f64::from(*p)).sum::<f64>() / percentages.len() as f64
            };
            VaccineStat {
                vaccine: vaccine.name.clone(),
                percentages,
                min,
                max,
                average,
            }
        })
        .collect()
}

/// Splits `items` into two display columns when there are more than
/// `threshold` of them: `ceil(n / 2)` on the left, the rest on the right.
pub fn split_columns<T>(items: &[T], threshold: usize) -> (&[T], &[T]) {
    if items.len() > threshold {
        items.split_at((items.len() + 1) / 2)
    } else {
        (items, &[])
    }
}

/// One-line description of a summary, as printed in the PDF and on the console.
pub fn summary_line(summary: &VaccineSummary, name_threshold: usize) -> String {
    format!(
        "{}: Complete {} ({}%), In Progress {} ({}%), Not Started {} ({}%)",
        abbreviate_vaccine_name(&summary.vaccine, name_threshold),
        summary.complete,
        summary.complete_percentage,
        summary.in_progress,
        summary.in_progress_percentage,
        summary.not_started,
        summary.not_started_percentage
    )
}

/// Minimum, maximum and average of the recorded percentages of one vaccine.
pub fn stat_line(stat: &VaccineStat, name_threshold: usize) -> String {
    let name = abbreviate_vaccine_name(&stat.vaccine, name_threshold);
    if stat.percentages.is_empty() {
        return format!("{}: no records", name);
    }
    format!(
        "{}: min {}%, max {}%, average {:.1}% over {} record(s)",
        name,
        stat.min,
        stat.max,
        stat.average,
        stat.percentages.len()
    )
}

/// Draws the summary section below the table.
pub fn draw_summary<C: Canvas>(
    paginator: &mut Paginator<'_, C>,
    summaries: &[VaccineSummary],
    infant_count: usize,
) -> Result<()> {
    let settings = paginator.settings();
    let section = &settings.summary;
    let threshold = settings.layout.abbreviation_threshold;

    paginator.reserve_section(SUMMARY_TITLE, section.min_height)?;

    let left = paginator.left();
    let width = paginator.content_width();
    let heading_height = section.line_height * 3 / 2;

    let y = paginator.claim(heading_height)?;
    paginator.canvas_mut().draw_text(
        left,
        y,
        &TextStyle::bold(section.heading_font_size),
        SUMMARY_TITLE,
    )?;

    let y = paginator.claim(section.line_height)?;
    paginator.canvas_mut().draw_text(
        left,
        y,
        &TextStyle::regular(section.font_size),
        &format!("Infants included: {}", infant_count),
    )?;

    if summaries.is_empty() {
        let y = paginator.claim(section.line_height)?;
        paginator.canvas_mut().draw_text(
            left,
            y,
            &TextStyle::regular(section.font_size),
            "No vaccination records match the selected filters.",
        )?;
        return Ok(());
    }

    let (first, second) = split_columns(summaries, section.two_column_threshold);
    let column_width = if second.is_empty() { width } else { width / 2 };
    let style = TextStyle::regular(section.font_size);

    for (index, summary) in first.iter().enumerate() {
        let y = paginator.claim(section.line_height)?;
        let text = fit_text(&summary_line(summary, threshold), column_width, style.size);
        paginator.canvas_mut().draw_text(left, y, &style, &text)?;

        if let Some(other) = second.get(index) {
            let text = fit_text(&summary_line(other, threshold), column_width, style.size);
            paginator
                .canvas_mut()
                .draw_text(left + column_width, y, &style, &text)?;
        }
    }
    Ok(())
}
