//! Records consumed by the report generator.
//!
//! The backend exports infants as loosely shaped JSON: dates are optional
//! strings, identifiers may be numeric or textual, and names are split
//! across several fields.  Everything is validated once while
//! deserializing, so the layout and aggregation code only ever sees the
//! checked types defined here.

use std::fmt;

use serde::Deserialize;
use time::macros::format_description;
use time::{Date, Month};

use crate::error::{ReportError, Result};

/// Maximum number of doses a vaccine schedule can carry.
pub const MAX_DOSES: usize = 3;

/// Parses a backend date, accepting either `YYYY-MM-DD` or an ISO timestamp
/// that starts with one.
pub fn parse_date(raw: &str) -> Result<Date> {
    let trimmed = raw.trim();
    let head = trimmed.get(..10).unwrap_or(trimmed);
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(head, &format)
        .map_err(|err| ReportError::Data(format!("invalid date '{}': {}", raw, err)))
}

fn parse_optional_date(raw: Option<String>) -> Result<Option<Date>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(value).map(Some),
    }
}

/// How a report lays out its rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReportMode {
    /// One row per infant, one column per distinct vaccine.
    #[default]
    All,
    /// One row per administered dose, grouped by month of administration.
    Monthly,
}

impl ReportMode {
    /// Returns the slug used in file names and on the command line.
    pub fn slug(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for ReportMode {
    type Err = ReportError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" | "all-vaccines" => Ok(Self::All),
            "monthly" | "month" => Ok(Self::Monthly),
            other => Err(ReportError::Data(format!("unknown report mode '{}'", other))),
        }
    }
}

/// Gender as recorded by the registration form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
    Other(String),
}

impl Gender {
    /// Single-letter label used in narrow table cells.
    pub fn short_label(&self) -> String {
        match self {
            Self::Male => "M".to_string(),
            Self::Female => "F".to_string(),
            Self::Other(value) => value
                .chars()
                .next()
                .map(|c| c.to_uppercase().collect())
                .unwrap_or_default(),
        }
    }
}

impl From<&str> for Gender {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Self::Male,
            "female" | "f" => Self::Female,
            _ => Self::Other(value.trim().to_string()),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => f.write_str("Male"),
            Self::Female => f.write_str("Female"),
            Self::Other(value) => f.write_str(value),
        }
    }
}

/// Home address of an infant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub purok: Option<String>,
    #[serde(default)]
    pub baranggay: String,
    #[serde(default)]
    pub municipality: Option<String>,
}

/// Vaccine referenced by a schedule entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vaccine {
    pub id: String,
    pub name: String,
    /// Display rank; lower values come first.
    pub sort: i32,
    /// Number of doses required, 1 to 3.
    pub frequency: u8,
}

/// Scheduled and actual date of one dose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DoseSlot {
    pub scheduled: Option<Date>,
    pub administered: Option<Date>,
}

/// One vaccine on an infant's schedule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VaccinationSchedule {
    pub vaccine: Vaccine,
    pub doses: [DoseSlot; MAX_DOSES],
    /// Completion percentage, 0 to 100.
    pub percentage: u8,
}

impl VaccinationSchedule {
    /// Returns the doses that count towards this vaccine, paired with their
    /// 1-based dose number.
    pub fn expected_doses(&self) -> impl Iterator<Item = (u8, &DoseSlot)> {
        self.doses
            .iter()
            .take(usize::from(self.vaccine.frequency))
            .enumerate()
            .map(|(index, slot)| (index as u8 + 1, slot))
    }

    /// Returns the administered doses as `(dose number, date)` pairs.
    pub fn administered_doses(&self) -> impl Iterator<Item = (u8, Date)> + '_ {
        self.expected_doses()
            .filter_map(|(number, slot)| slot.administered.map(|date| (number, date)))
    }
}

/// An infant and their vaccination schedule.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawInfant")]
pub struct Infant {
    pub id: String,
    pub full_name: String,
    pub gender: Gender,
    pub address: Address,
    pub schedules: Vec<VaccinationSchedule>,
}

impl Infant {
    /// Returns the schedule entry for the named vaccine, if any.
    pub fn schedule_for(&self, vaccine_name: &str) -> Option<&VaccinationSchedule> {
        self.schedules
            .iter()
            .find(|schedule| schedule.vaccine.name.eq_ignore_ascii_case(vaccine_name))
    }
}

/// Year and month pair used to group monthly rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    /// Calendar month, 1 to 12.
    pub month: u8,
}

impl YearMonth {
    pub fn new(year: i32, month: Month) -> Self {
        Self {
            year,
            month: month as u8,
        }
    }

    pub fn of(date: Date) -> Self {
        Self::new(date.year(), date.month())
    }

    /// Parses `YYYY-MM`.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || ReportError::Data(format!("invalid month '{}', expected YYYY-MM", raw));
        let (year, month) = raw.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        let month = Month::try_from(month).map_err(|_| invalid())?;
        Ok(Self::new(year, month))
    }

    pub fn calendar_month(self) -> Month {
        Month::try_from(self.month).unwrap_or(Month::January)
    }

    pub fn contains(self, date: Date) -> bool {
        Self::of(date) == self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{}", value),
            Self::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVaccine {
    #[serde(default)]
    id: Option<RawId>,
    name: String,
    #[serde(default)]
    sort: Option<i32>,
    #[serde(default)]
    frequency: Option<u8>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSchedule {
    vaccine: RawVaccine,
    #[serde(default)]
    first_dose: Option<String>,
    #[serde(default)]
    second_dose: Option<String>,
    #[serde(default)]
    third_dose: Option<String>,
    #[serde(default)]
    updated_first_dose: Option<String>,
    #[serde(default)]
    updated_second_dose: Option<String>,
    #[serde(default)]
    updated_third_dose: Option<String>,
    #[serde(default)]
    percentage: Option<f64>,
}

/// Rounds to a whole percentage while keeping partial progress distinct
/// from both "not started" (0) and "complete" (100).
fn whole_percentage(percentage: f64) -> u8 {
    let rounded = percentage.round();
    if percentage > 0.0 && rounded < 1.0 {
        1
    } else if percentage < 100.0 && rounded > 99.0 {
        99
    } else {
        rounded as u8
    }
}

impl TryFrom<RawSchedule> for VaccinationSchedule {
    type Error = ReportError;

    fn try_from(raw: RawSchedule) -> Result<Self> {
        let frequency = raw.vaccine.frequency.unwrap_or(1);
        if !(1..=MAX_DOSES as u8).contains(&frequency) {
            return Err(ReportError::Data(format!(
                "vaccine '{}' has frequency {}, expected 1 to {}",
                raw.vaccine.name, frequency, MAX_DOSES
            )));
        }

        let percentage = raw.percentage.unwrap_or(0.0);
        if !(0.0..=100.0).contains(&percentage) {
            return Err(ReportError::Data(format!(
                "vaccine '{}' has percentage {}, expected 0 to 100",
                raw.vaccine.name, percentage
            )));
        }

        let doses = [
            DoseSlot {
                scheduled: parse_optional_date(raw.first_dose)?,
                administered: parse_optional_date(raw.updated_first_dose)?,
            },
            DoseSlot {
                scheduled: parse_optional_date(raw.second_dose)?,
                administered: parse_optional_date(raw.updated_second_dose)?,
            },
            DoseSlot {
                scheduled: parse_optional_date(raw.third_dose)?,
                administered: parse_optional_date(raw.updated_third_dose)?,
            },
        ];

        let name = raw.vaccine.name.trim().to_string();
        Ok(Self {
            vaccine: Vaccine {
                id: raw
                    .vaccine
                    .id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| name.clone()),
                name,
                sort: raw.vaccine.sort.unwrap_or(i32::MAX),
                frequency,
            },
            doses,
            percentage: whole_percentage(percentage),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInfant {
    id: RawId,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    middle_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    address: Address,
    #[serde(default, alias = "vaccinationSchedule", alias = "schedules")]
    vaccination_schedules: Vec<RawSchedule>,
}

impl RawInfant {
    fn resolved_name(&self) -> String {
        if let Some(full) = self.full_name.as_deref().map(str::trim) {
            if !full.is_empty() {
                return full.to_string();
            }
        }
        [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .filter_map(|part| part.as_deref().map(str::trim))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl TryFrom<RawInfant> for Infant {
    /// Plain message; the caller wraps it into [`ReportError::Data`].
    type Error = String;

    fn try_from(raw: RawInfant) -> std::result::Result<Self, String> {
        let full_name = raw.resolved_name();
        let gender = Gender::from(raw.gender.as_deref().unwrap_or_default());
        let schedules = raw
            .vaccination_schedules
            .into_iter()
            .map(VaccinationSchedule::try_from)
            .collect::<Result<Vec<_>>>()
            .map_err(|err| match err {
                ReportError::Data(message) => format!("infant {}: {}", raw.id, message),
                other => format!("infant {}: {}", raw.id, other),
            })?;

        Ok(Self {
            id: raw.id.to_string(),
            full_name,
            gender,
            address: raw.address,
            schedules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_plain_dates_and_timestamps() {
        assert_eq!(parse_date("2024-01-04").unwrap(), date!(2024 - 01 - 04));
        assert_eq!(
            parse_date("2024-01-04T08:30:00.000Z").unwrap(),
            date!(2024 - 01 - 04)
        );
        assert!(parse_date("04/01/2024").is_err());
    }

    #[test]
    fn deserializes_backend_infant() {
        let json = r#"{
            "id": 7,
            "firstName": "Maria",
            "lastName": "Santos",
            "gender": "female",
            "address": { "purok": "3", "baranggay": "San Isidro" },
            "vaccinationSchedules": [{
                "vaccine": { "id": 2, "name": "Pentavalent Vaccine", "sort": 3, "frequency": 3 },
                "firstDose": "2024-01-01",
                "updatedFirstDose": "2024-01-04",
                "secondDose": "2024-02-01",
                "updatedSecondDose": "",
                "percentage": 33.33
            }]
        }"#;

        let infant: Infant = serde_json::from_str(json).unwrap();
        assert_eq!(infant.id, "7");
        assert_eq!(infant.full_name, "Maria Santos");
        assert_eq!(infant.gender, Gender::Female);
        assert_eq!(infant.address.baranggay, "San Isidro");

        let schedule = &infant.schedules[0];
        assert_eq!(schedule.vaccine.frequency, 3);
        assert_eq!(schedule.percentage, 33);
        assert_eq!(schedule.doses[0].administered, Some(date!(2024 - 01 - 04)));
        assert_eq!(schedule.doses[1].administered, None);
        assert_eq!(schedule.administered_doses().count(), 1);
    }

    #[test]
    fn rejects_out_of_range_frequency() {
        let json = r#"{
            "id": "a1",
            "fullName": "Juan Cruz",
            "vaccinationSchedules": [{
                "vaccine": { "name": "BCG", "frequency": 4 },
                "percentage": 0
            }]
        }"#;

        let err = serde_json::from_str::<Infant>(json).unwrap_err();
        assert!(err.to_string().contains("frequency"));
    }

    #[test]
    fn doses_beyond_frequency_are_ignored() {
        let json = r#"{
            "id": 1,
            "fullName": "Ana Reyes",
            "vaccinationSchedules": [{
                "vaccine": { "name": "BCG", "frequency": 1 },
                "firstDose": "2024-01-01",
                "updatedFirstDose": "2024-01-01",
                "updatedSecondDose": "2024-02-01",
                "percentage": 100
            }]
        }"#;

        let infant: Infant = serde_json::from_str(json).unwrap();
        assert_eq!(infant.schedules[0].administered_doses().count(), 1);
    }

    #[test]
    fn partial_progress_never_rounds_to_the_ends() {
        assert_eq!(whole_percentage(0.0), 0);
        assert_eq!(whole_percentage(0.4), 1);
        assert_eq!(whole_percentage(33.33), 33);
        assert_eq!(whole_percentage(66.5), 67);
        assert_eq!(whole_percentage(99.6), 99);
        assert_eq!(whole_percentage(100.0), 100);

        let json = r#"{
            "id": 2,
            "fullName": "Lito Bautista",
            "vaccinationSchedules": [
                { "vaccine": { "name": "BCG" }, "percentage": 0.4 },
                { "vaccine": { "name": "OPV" }, "percentage": 99.7 }
            ]
        }"#;
        let infant: Infant = serde_json::from_str(json).unwrap();
        let percentages: Vec<_> = infant.schedules.iter().map(|s| s.percentage).collect();
        assert_eq!(percentages, vec![1, 99]);
    }

    #[test]
    fn year_month_parses_and_orders() {
        let march = YearMonth::parse("2024-03").unwrap();
        assert_eq!(march.calendar_month(), Month::March);
        assert!(YearMonth::parse("2023-12").unwrap() < march);
        assert!(march.contains(date!(2024 - 03 - 31)));
        assert!(YearMonth::parse("2024-13").is_err());
    }

    #[test]
    fn report_mode_round_trips_through_slug() {
        assert_eq!("monthly".parse::<ReportMode>().unwrap(), ReportMode::Monthly);
        assert_eq!(ReportMode::All.to_string(), "all");
        assert!("weekly".parse::<ReportMode>().is_err());
    }
}
