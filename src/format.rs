//! Display strings for dates, percentages, statuses and vaccine labels.

use time::macros::format_description;
use time::Date;

use crate::model::YearMonth;

const ELLIPSIS: &str = "...";
const VACCINE_SUFFIX: &str = " Vaccine";

/// Layout units per typographic point (layout units are tenths of a millimetre).
const UNITS_PER_POINT_MILLI: u32 = 3528;
/// Average Helvetica glyph advance as a fraction of the font size, in thousandths.
const AVERAGE_GLYPH_WIDTH_MILLI: u32 = 500;

/// Formats a date as `Jan 04, 2024`.
pub fn format_date(date: Date) -> String {
    let format = format_description!("[month repr:short] [day], [year]");
    date.format(&format)
        .unwrap_or_else(|_| date.to_string())
}

/// Formats a date as `2024-01-04`.
pub fn format_iso_date(date: Date) -> String {
    let format = format_description!("[year]-[month]-[day]");
    date.format(&format)
        .unwrap_or_else(|_| date.to_string())
}

/// Formats a month heading as `January 2024`.
pub fn format_month(month: YearMonth) -> String {
    format!("{} {}", month.calendar_month(), month.year)
}

/// Formats a completion percentage as `67%`.
pub fn format_percentage(percentage: u8) -> String {
    format!("{}%", percentage)
}

/// Returns the status label for a completion percentage.
pub fn status_label(percentage: u8) -> &'static str {
    match percentage {
        0 => "Not Started",
        100..=u8::MAX => "Complete",
        _ => "In Progress",
    }
}

/// Returns `Dose 1`, `Dose 2`, ...
pub fn dose_label(number: u8) -> String {
    format!("Dose {}", number)
}

/// Shortens a vaccine name for use as a column header.
///
/// A parenthesized acronym wins (`Bacillus Calmette-Guerin (BCG)` becomes
/// `BCG`).  Otherwise a trailing ` Vaccine` is dropped, and a name that is
/// still longer than `threshold` characters collapses to the initials of its
/// words, or is cut to `threshold` characters ending in `...` when it is a
/// single word.
pub fn abbreviate_vaccine_name(name: &str, threshold: usize) -> String {
    let name = name.trim();

    if let Some(acronym) = parenthesized_acronym(name) {
        return acronym.to_string();
    }

    let stripped = name.strip_suffix(VACCINE_SUFFIX).unwrap_or(name).trim_end();
    if stripped.chars().count() <= threshold {
        return stripped.to_string();
    }

    let words: Vec<&str> = stripped
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|word| !word.is_empty())
        .collect();
    if words.len() > 1 {
        let initials: String = words
            .iter()
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .collect();
        if initials.chars().count() <= threshold {
            return initials;
        }
    }

    truncate_chars(stripped, threshold)
}

fn parenthesized_acronym(name: &str) -> Option<&str> {
    let open = name.find('(')?;
    let close = open + name[open..].find(')')?;
    let inner = name[open + 1..close].trim();
    if inner.is_empty() || inner.contains(char::is_whitespace) {
        None
    } else {
        Some(inner)
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(&ELLIPSIS[..limit.min(ELLIPSIS.len())]);
    out
}

fn glyph_width(font_size: u8) -> u32 {
    (u32::from(font_size) * AVERAGE_GLYPH_WIDTH_MILLI * UNITS_PER_POINT_MILLI / 1_000_000).max(1)
}

/// Estimated rendered width of `text` in layout units at `font_size` points.
pub fn estimated_text_width(text: &str, font_size: u8) -> u32 {
    text.chars().count() as u32 * glyph_width(font_size)
}

/// Truncates `text` with `...` so that its estimated width fits `width`.
pub fn fit_text(text: &str, width: u32, font_size: u8) -> String {
    if estimated_text_width(text, font_size) <= width {
        return text.to_string();
    }
    let capacity = (width / glyph_width(font_size)) as usize;
    truncate_chars(text, capacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use time::Month;

    #[test]
    fn formats_dates_and_months() {
        assert_eq!(format_date(date!(2024 - 01 - 04)), "Jan 04, 2024");
        assert_eq!(format_iso_date(date!(2024 - 01 - 04)), "2024-01-04");
        assert_eq!(
            format_month(YearMonth::new(2024, Month::March)),
            "March 2024"
        );
    }

    #[test]
    fn status_follows_percentage() {
        assert_eq!(status_label(0), "Not Started");
        assert_eq!(status_label(1), "In Progress");
        assert_eq!(status_label(99), "In Progress");
        assert_eq!(status_label(100), "Complete");
    }

    #[test]
    fn abbreviation_prefers_acronym() {
        assert_eq!(
            abbreviate_vaccine_name("Bacillus Calmette-Guerin (BCG)", 12),
            "BCG"
        );
        assert_eq!(
            abbreviate_vaccine_name("Pneumococcal Conjugate Vaccine (PCV)", 12),
            "PCV"
        );
    }

    #[test]
    fn abbreviation_strips_vaccine_suffix() {
        assert_eq!(abbreviate_vaccine_name("Hepatitis B Vaccine", 12), "Hepatitis B");
        assert_eq!(abbreviate_vaccine_name("Pentavalent Vaccine", 12), "Pentavalent");
    }

    #[test]
    fn long_names_use_initials_or_ellipsis() {
        assert_eq!(
            abbreviate_vaccine_name("Measles Mumps Rubella", 12),
            "MMR"
        );
        assert_eq!(
            abbreviate_vaccine_name("Inactivatedpoliovirus", 12),
            "Inactivat..."
        );
    }

    #[test]
    fn abbreviation_is_idempotent_on_short_output() {
        let names = [
            "BCG",
            "Hepatitis B Vaccine",
            "Oral Polio Vaccine (OPV)",
            "Measles Mumps Rubella",
            "Inactivatedpoliovirus",
            "Pentavalent Vaccine",
        ];
        for name in names {
            let once = abbreviate_vaccine_name(name, 12);
            let twice = abbreviate_vaccine_name(&once, 12);
            assert_eq!(once, twice, "abbreviating {name:?} twice changed it");
            assert_eq!(once, abbreviate_vaccine_name(name, 12));
        }
    }

    #[test]
    fn fit_text_truncates_wide_cells() {
        let text = "Maria Clara Dela Cruz Santos";
        assert_eq!(fit_text(text, 10_000, 9), text);

        let fitted = fit_text(text, 200, 9);
        assert!(fitted.ends_with("..."));
        assert!(estimated_text_width(&fitted, 9) <= 200);
    }
}
