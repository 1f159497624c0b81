//! One-infant compliance sheet rendered as a flowing `genpdf` document.

use genpdf::elements::{Break, FrameCellDecorator, Paragraph, TableLayout};
use genpdf::style::Style;
use genpdf::{Element as _, Margins, PaperSize};
use log::info;
use time::Date;

use crate::builder::SheetBuilder;
use crate::error::Result;
use crate::format::{dose_label, format_date};
use crate::timing::{TimingAnalysis, UpcomingDose};

const HEADING_SIZE: u8 = 16;
const SECTION_SIZE: u8 = 12;
const BODY_SIZE: u8 = 9;

fn section(title: &str) -> impl genpdf::Element {
    Paragraph::new(title).styled(Style::new().bold().with_font_size(SECTION_SIZE))
}

fn cell(text: String) -> impl genpdf::Element {
    Paragraph::new(text).padded(1)
}

fn header_cell(text: &str) -> impl genpdf::Element {
    Paragraph::new(text).styled(Style::new().bold()).padded(1)
}

fn score_text(score: Option<f64>) -> String {
    match score {
        Some(score) => format!("{:.1} / 100", score),
        None => "No administered doses yet".to_string(),
    }
}

fn upcoming_text(dose: &UpcomingDose) -> String {
    let when = if dose.is_overdue() {
        format!("OVERDUE by {} day(s)", dose.days_until.unsigned_abs())
    } else if dose.days_until == 0 {
        "due today".to_string()
    } else {
        format!("in {} day(s)", dose.days_until)
    };
    format!(
        "{} {}: {} ({})",
        dose.vaccine,
        dose_label(dose.dose),
        format_date(dose.scheduled),
        when
    )
}

/// Renders the timing analysis of one infant to PDF bytes.
pub fn render_compliance_sheet(
    analysis: &TimingAnalysis,
    upcoming: &[UpcomingDose],
    generated_on: Date,
) -> Result<Vec<u8>> {
    let mut document = SheetBuilder::new()
        .with_title(format!("Compliance sheet - {}", analysis.infant_name))
        .with_paper_size(PaperSize::A4)
        .with_margins(Margins::trbl(15, 15, 15, 15))
        .with_font_size(BODY_SIZE)
        .with_header(format!("Dose timing: {}", analysis.infant_name))
        .with_footer(format!("Generated {}", format_date(generated_on)))
        .build()?;

    document.push(
        Paragraph::new("Vaccination Compliance Sheet")
            .styled(Style::new().bold().with_font_size(HEADING_SIZE)),
    );
    document.push(Break::new(1));
    document.push(Paragraph::new(format!("Infant: {}", analysis.infant_name)));
    document.push(Paragraph::new(format!("Record ID: {}", analysis.infant_id)));
    document.push(Break::new(1));

    document.push(section("Administered doses"));
    if analysis.doses.is_empty() {
        document.push(Paragraph::new("No administered doses recorded."));
    } else {
        let mut table = TableLayout::new(vec![3, 1, 2, 2, 2, 1]);
        table.set_cell_decorator(FrameCellDecorator::new(true, true, false));
        table
            .row()
            .element(header_cell("Vaccine"))
            .element(header_cell("Dose"))
            .element(header_cell("Scheduled"))
            .element(header_cell("Given"))
            .element(header_cell("Timing"))
            .element(header_cell("Score"))
            .push()?;
        for dose in &analysis.doses {
            table
                .row()
                .element(cell(dose.vaccine.clone()))
                .element(cell(dose.dose.to_string()))
                .element(cell(format_date(dose.scheduled)))
                .element(cell(format_date(dose.administered)))
                .element(cell(dose.status.to_string()))
                .element(cell(dose.score.to_string()))
                .push()?;
        }
        document.push(table);
    }
    document.push(Break::new(1));

    let breakdown = &analysis.breakdown;
    document.push(section("Timing breakdown"));
    document.push(Paragraph::new(format!(
        "On time: {} ({}%)   Early: {} ({}%)   Late: {} ({}%)",
        breakdown.on_time,
        breakdown.on_time_percentage,
        breakdown.early,
        breakdown.early_percentage,
        breakdown.late,
        breakdown.late_percentage
    )));
    document.push(Paragraph::new(format!(
        "Average deviation from schedule: {} day(s)",
        breakdown.average_deviation_days
    )));
    for schedule in &analysis.schedules {
        document.push(Paragraph::new(format!(
            "{}: {:.1} over {} dose(s)",
            schedule.vaccine, schedule.score, schedule.doses
        )));
    }
    document.push(Break::new(1));

    document.push(section("Compliance score"));
    document.push(
        Paragraph::new(score_text(analysis.overall_score))
            .styled(Style::new().bold().with_font_size(SECTION_SIZE)),
    );

    if !upcoming.is_empty() {
        document.push(Break::new(1));
        document.push(section("Upcoming doses"));
        for dose in upcoming {
            document.push(Paragraph::new(upcoming_text(dose)));
        }
    }

    let mut bytes = Vec::new();
    document.render(&mut bytes)?;
    info!(
        "rendered compliance sheet for {} ({} bytes)",
        analysis.infant_id,
        bytes.len()
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn describes_upcoming_doses() {
        let mut dose = UpcomingDose {
            vaccine: "MMR".into(),
            dose: 1,
            scheduled: date!(2024 - 03 - 01),
            days_until: -3,
        };
        assert_eq!(
            upcoming_text(&dose),
            "MMR Dose 1: Mar 01, 2024 (OVERDUE by 3 day(s))"
        );
        dose.days_until = 0;
        assert!(upcoming_text(&dose).ends_with("(due today)"));
        dose.days_until = 12;
        assert!(upcoming_text(&dose).ends_with("(in 12 day(s))"));
    }

    #[test]
    fn score_text_handles_missing_score() {
        assert_eq!(score_text(Some(92.5)), "92.5 / 100");
        assert_eq!(score_text(None), "No administered doses yet");
    }
}
