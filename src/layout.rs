//! Column planning for the coverage table.
//!
//! Widths are integer layout units and every table plan spans the usable
//! width exactly: integer-division leftovers go to the last column.  When
//! too many vaccines are present for each to get the configured minimum
//! width, the vaccines are split across several bands, each of which is
//! rendered as its own table with the identity columns repeated.

use std::ops::Range;

use log::debug;

use crate::format::abbreviate_vaccine_name;
use crate::model::{Infant, ReportMode, Vaccine};
use crate::settings::LayoutSettings;

/// What a column shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Name,
    Gender,
    Locality,
    /// Completion of the vaccine at this index of the ordered vaccine list.
    Vaccine(usize),
    /// Vaccine and dose number of a monthly row.
    Dose,
    Date,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub header: String,
    pub width: u32,
    pub kind: ColumnKind,
}

impl Column {
    fn new(header: impl Into<String>, width: u32, kind: ColumnKind) -> Self {
        Self {
            header: header.into(),
            width,
            kind,
        }
    }
}

/// Columns of one rendered table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnPlan {
    pub columns: Vec<Column>,
    /// Indices into the ordered vaccine list covered by this table.
    pub vaccines: Range<usize>,
}

impl ColumnPlan {
    pub fn total_width(&self) -> u32 {
        self.columns.iter().map(|column| column.width).sum()
    }

    pub fn widths(&self) -> Vec<u32> {
        self.columns.iter().map(|column| column.width).collect()
    }

    /// Left edge of every column relative to the table's left edge.
    pub fn offsets(&self) -> Vec<u32> {
        self.columns
            .iter()
            .scan(0, |x, column| {
                let left = *x;
                *x += column.width;
                Some(left)
            })
            .collect()
    }
}

/// The tables needed to show every vaccine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnLayout {
    pub bands: Vec<ColumnPlan>,
}

impl ColumnLayout {
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }
}

/// Collects the distinct vaccines referenced by `infants`, ordered by their
/// `sort` rank with ties kept in first-seen order.
pub fn ordered_vaccines<'a, I>(infants: I) -> Vec<Vaccine>
where
    I: IntoIterator<Item = &'a Infant>,
{
    let mut vaccines: Vec<Vaccine> = Vec::new();
    for infant in infants {
        for schedule in &infant.schedules {
            if !vaccines
                .iter()
                .any(|known| known.name.eq_ignore_ascii_case(&schedule.vaccine.name))
            {
                vaccines.push(schedule.vaccine.clone());
            }
        }
    }
    vaccines.sort_by_key(|vaccine| vaccine.sort);
    vaccines
}

/// Plans the table columns for the usable `width`.
pub fn plan_columns(
    width: u32,
    mode: ReportMode,
    vaccine_names: &[String],
    settings: &LayoutSettings,
) -> ColumnLayout {
    let layout = match mode {
        ReportMode::All => plan_all_vaccines(width, vaccine_names, settings),
        ReportMode::Monthly => plan_monthly(width, settings),
    };
    debug!(
        "planned {} table(s) for {} vaccine(s) over width {}",
        layout.band_count(),
        vaccine_names.len(),
        width
    );
    layout
}

fn shares_of(width: u32, shares: &[u32]) -> Vec<u32> {
    let total: u64 = shares.iter().copied().map(u64::from).sum();
    let scale = total.max(100);
    shares
        .iter()
        .map(|share| (u64::from(width) * u64::from(*share) / scale) as u32)
        .collect()
}

fn plan_monthly(width: u32, settings: &LayoutSettings) -> ColumnLayout {
    let fixed = shares_of(
        width,
        &[settings.monthly_name_share, settings.monthly_vaccine_share],
    );
    let date = width - fixed[0] - fixed[1];

    ColumnLayout {
        bands: vec![ColumnPlan {
            columns: vec![
                Column::new("Name", fixed[0], ColumnKind::Name),
                Column::new("Vaccine", fixed[1], ColumnKind::Dose),
                Column::new("Date Given", date, ColumnKind::Date),
            ],
            vaccines: 0..0,
        }],
    }
}

fn identity_columns(widths: &[u32]) -> Vec<Column> {
    vec![
        Column::new("Name", widths[0], ColumnKind::Name),
        Column::new("Sex", widths[1], ColumnKind::Gender),
        Column::new("Baranggay", widths[2], ColumnKind::Locality),
    ]
}

fn plan_all_vaccines(width: u32, vaccine_names: &[String], settings: &LayoutSettings) -> ColumnLayout {
    let fixed = shares_of(
        width,
        &[
            settings.name_share,
            settings.gender_share,
            settings.locality_share,
        ],
    );
    let remaining = width - fixed.iter().sum::<u32>();

    if vaccine_names.is_empty() {
        let mut columns = identity_columns(&fixed);
        if let Some(last) = columns.last_mut() {
            last.width += remaining;
        }
        return ColumnLayout {
            bands: vec![ColumnPlan {
                columns,
                vaccines: 0..0,
            }],
        };
    }

    let bands = band_ranges(vaccine_names.len(), remaining, settings.min_vaccine_column_width)
        .into_iter()
        .map(|range| {
            let mut columns = identity_columns(&fixed);
            let count = range.len() as u32;
            let share = remaining / count;
            for (position, index) in range.clone().enumerate() {
                let width = if position + 1 == range.len() {
                    remaining - share * (count - 1)
                } else {
                    share
                };
                columns.push(Column::new(
                    abbreviate_vaccine_name(&vaccine_names[index], settings.abbreviation_threshold),
                    width,
                    ColumnKind::Vaccine(index),
                ));
            }
            ColumnPlan {
                columns,
                vaccines: range,
            }
        })
        .collect();

    ColumnLayout { bands }
}

/// Splits `count` vaccines into evenly sized bands so that every vaccine
/// column is at least `min_width` wide, keeping at least one vaccine per band.
fn band_ranges(count: usize, available: u32, min_width: u32) -> Vec<Range<usize>> {
    let per_band = if min_width == 0 {
        count
    } else {
        ((available / min_width) as usize).clamp(1, count)
    };
    let band_count = (count + per_band - 1) / per_band;
    let base = count / band_count;
    let extra = count % band_count;

    let mut ranges = Vec::with_capacity(band_count);
    let mut start = 0;
    for band in 0..band_count {
        let len = base + usize::from(band < extra);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("Vaccine {}", i + 1)).collect()
    }

    #[test]
    fn widths_always_sum_to_page_width() {
        let settings = LayoutSettings::default();
        for width in [0, 1, 7, 99, 333, 1000, 1001, 2770, 4999] {
            for count in 0..30 {
                for mode in [ReportMode::All, ReportMode::Monthly] {
                    let layout = plan_columns(width, mode, &names(count), &settings);
                    for band in &layout.bands {
                        assert_eq!(
                            band.total_width(),
                            width,
                            "mode {mode} width {width} vaccines {count}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn empty_vaccine_list_degrades_to_identity_columns() {
        let layout = plan_columns(1000, ReportMode::All, &[], &LayoutSettings::default());
        assert_eq!(layout.band_count(), 1);
        let kinds: Vec<_> = layout.bands[0].columns.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![ColumnKind::Name, ColumnKind::Gender, ColumnKind::Locality]
        );
        assert_eq!(layout.bands[0].total_width(), 1000);
    }

    #[test]
    fn vaccines_share_remaining_width_equally() {
        let layout = plan_columns(1000, ReportMode::All, &names(7), &LayoutSettings::default());
        assert_eq!(layout.band_count(), 1);
        assert_eq!(layout.bands[0].widths(), vec![200, 60, 120, 88, 88, 88, 88, 88, 88, 92]);
        assert_eq!(layout.bands[0].vaccines, 0..7);
    }

    #[test]
    fn monthly_columns_ignore_vaccine_count() {
        let settings = LayoutSettings::default();
        let few = plan_columns(1000, ReportMode::Monthly, &names(1), &settings);
        let many = plan_columns(1000, ReportMode::Monthly, &names(20), &settings);
        assert_eq!(few, many);
        assert_eq!(few.bands[0].widths(), vec![400, 350, 250]);
    }

    #[test]
    fn narrow_pages_split_vaccines_into_bands() {
        let settings = LayoutSettings::default();
        let layout = plan_columns(1000, ReportMode::All, &names(20), &settings);

        assert_eq!(layout.band_count(), 3);
        let covered: Vec<usize> = layout
            .bands
            .iter()
            .flat_map(|band| band.vaccines.clone())
            .collect();
        assert_eq!(covered, (0..20).collect::<Vec<_>>());

        for band in &layout.bands {
            assert_eq!(band.total_width(), 1000);
            for column in &band.columns[3..] {
                assert!(column.width >= settings.min_vaccine_column_width);
            }
        }
    }

    #[test]
    fn headers_are_abbreviated() {
        let layout = plan_columns(
            2770,
            ReportMode::All,
            &["Bacillus Calmette-Guerin (BCG)".to_string(), "Hepatitis B Vaccine".to_string()],
            &LayoutSettings::default(),
        );
        let headers: Vec<_> = layout.bands[0].columns.iter().map(|c| c.header.as_str()).collect();
        assert_eq!(headers, vec!["Name", "Sex", "Baranggay", "BCG", "Hepatitis B"]);
    }

    #[test]
    fn oversized_shares_are_scaled_down() {
        let settings = LayoutSettings {
            name_share: u32::MAX,
            gender_share: u32::MAX,
            locality_share: u32::MAX,
            monthly_name_share: u32::MAX,
            monthly_vaccine_share: u32::MAX,
            ..LayoutSettings::default()
        };
        for mode in [ReportMode::All, ReportMode::Monthly] {
            let layout = plan_columns(2770, mode, &names(3), &settings);
            for band in &layout.bands {
                assert_eq!(band.total_width(), 2770, "mode {mode}");
            }
        }
        let monthly = plan_columns(2770, ReportMode::Monthly, &[], &settings);
        assert_eq!(monthly.bands[0].widths(), vec![1385, 1385, 0]);
    }

    #[test]
    fn offsets_accumulate_widths() {
        let layout = plan_columns(1000, ReportMode::Monthly, &[], &LayoutSettings::default());
        assert_eq!(layout.bands[0].offsets(), vec![0, 400, 750]);
    }
}
