//! Dose timing and predictive compliance analysis for a single infant.
//!
//! Every dose that has both a scheduled and an administered date is
//! classified as on time, early or late by the signed day difference
//! `administered - scheduled`.  The compliance score maps the size of that
//! difference onto a fixed ladder and averages it per vaccine, then over
//! all vaccines with at least one administered dose.

use std::fmt;

use time::Date;

use crate::model::Infant;
use crate::summary::percent_of;

/// Score ladder: `(max days off schedule, score)`; anything beyond the last
/// step scores [`FALLBACK_SCORE`].
const SCORE_LADDER: &[(u32, u32)] = &[(0, 100), (3, 95), (7, 90), (14, 80), (30, 70)];
const FALLBACK_SCORE: u32 = 50;

/// How an administered dose relates to its scheduled date.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimingStatus {
    OnTime,
    Early(u32),
    Late(u32),
}

impl TimingStatus {
    pub fn from_day_difference(days: i64) -> Self {
        match days {
            0 => Self::OnTime,
            d if d < 0 => Self::Early(d.unsigned_abs() as u32),
            d => Self::Late(d as u32),
        }
    }
}

fn days(count: u32) -> &'static str {
    if count == 1 {
        "day"
    } else {
        "days"
    }
}

impl fmt::Display for TimingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnTime => f.write_str("ON TIME"),
            Self::Early(n) => write!(f, "EARLY by {} {}", n, days(*n)),
            Self::Late(n) => write!(f, "LATE by {} {}", n, days(*n)),
        }
    }
}

/// Score for a dose given `days` off schedule in either direction.
pub fn compliance_score(days: u32) -> u32 {
    SCORE_LADDER
        .iter()
        .find(|(limit, _)| days <= *limit)
        .map(|(_, score)| *score)
        .unwrap_or(FALLBACK_SCORE)
}

/// Timing of one administered dose.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DoseTiming {
    pub vaccine: String,
    pub dose: u8,
    pub scheduled: Date,
    pub administered: Date,
    /// `administered - scheduled` in days.
    pub day_difference: i64,
    pub status: TimingStatus,
    pub score: u32,
}

impl DoseTiming {
    pub fn new(vaccine: impl Into<String>, dose: u8, scheduled: Date, administered: Date) -> Self {
        let day_difference = (administered - scheduled).whole_days();
        Self {
            vaccine: vaccine.into(),
            dose,
            scheduled,
            administered,
            day_difference,
            status: TimingStatus::from_day_difference(day_difference),
            score: compliance_score(day_difference.unsigned_abs() as u32),
        }
    }
}

/// Counts and shares of on-time, early and late doses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimingBreakdown {
    pub total: usize,
    pub on_time: usize,
    pub early: usize,
    pub late: usize,
    pub on_time_percentage: u32,
    pub early_percentage: u32,
    pub late_percentage: u32,
    /// Mean absolute deviation from schedule, in whole days (rounded half up).
    pub average_deviation_days: u32,
}

impl TimingBreakdown {
    pub fn from_doses(doses: &[DoseTiming]) -> Self {
        let total = doses.len();
        let on_time = doses
            .iter()
            .filter(|dose| dose.status == TimingStatus::OnTime)
            .count();
        let early = doses
            .iter()
            .filter(|dose| matches!(dose.status, TimingStatus::Early(_)))
            .count();
        let late = total - on_time - early;
        let deviation: u64 = doses
            .iter()
            .map(|dose| dose.day_difference.unsigned_abs())
            .sum();
        let average_deviation_days = if total == 0 {
            0
        } else {
            ((2 * deviation + total as u64) / (2 * total as u64)) as u32
        };

        Self {
            total,
            on_time,
            early,
            late,
            on_time_percentage: percent_of(on_time, total),
            early_percentage: percent_of(early, total),
            late_percentage: percent_of(late, total),
            average_deviation_days,
        }
    }
}

/// Average dose score of one vaccine schedule.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleCompliance {
    pub vaccine: String,
    pub doses: usize,
    pub score: f64,
}

/// A dose that is scheduled but not yet administered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpcomingDose {
    pub vaccine: String,
    pub dose: u8,
    pub scheduled: Date,
    /// Days until the scheduled date; negative once overdue.
    pub days_until: i64,
}

impl UpcomingDose {
    pub fn is_overdue(&self) -> bool {
        self.days_until < 0
    }
}

/// Complete timing analysis for one infant.
#[derive(Clone, Debug, PartialEq)]
pub struct TimingAnalysis {
    pub infant_id: String,
    pub infant_name: String,
    pub doses: Vec<DoseTiming>,
    pub breakdown: TimingBreakdown,
    pub schedules: Vec<ScheduleCompliance>,
    /// Average of the schedule scores; `None` without any administered dose.
    pub overall_score: Option<f64>,
}

/// Analyzes every administered dose of `infant`.
pub fn analyze(infant: &Infant) -> TimingAnalysis {
    let mut doses = Vec::new();
    let mut schedules = Vec::new();

    for schedule in &infant.schedules {
        let timed: Vec<DoseTiming> = schedule
            .expected_doses()
            .filter_map(|(number, slot)| match (slot.scheduled, slot.administered) {
                (Some(scheduled), Some(administered)) => Some(DoseTiming::new(
                    schedule.vaccine.name.clone(),
                    number,
                    scheduled,
                    administered,
                )),
                _ => None,
            })
            .collect();

        if !timed.is_empty() {
            let score =
                timed.iter().map(|dose| f64::from(dose.score)).sum::<f64>() / timed.len() as f64;
            schedules.push(ScheduleCompliance {
                vaccine: schedule.vaccine.name.clone(),
                doses: timed.len(),
                score,
            });
        }
        doses.extend(timed);
    }

    let overall_score = if schedules.is_empty() {
        None
    } else {
        Some(schedules.iter().map(|s| s.score).sum::<f64>() / schedules.len() as f64)
    };

    TimingAnalysis {
        infant_id: infant.id.clone(),
        infant_name: infant.full_name.clone(),
        breakdown: TimingBreakdown::from_doses(&doses),
        doses,
        schedules,
        overall_score,
    }
}

/// Lists scheduled doses that have not been administered yet, soonest first.
pub fn upcoming_doses(infant: &Infant, today: Date) -> Vec<UpcomingDose> {
    let mut upcoming: Vec<UpcomingDose> = infant
        .schedules
        .iter()
        .flat_map(|schedule| {
            schedule
                .expected_doses()
                .filter(|(_, slot)| slot.administered.is_none())
                .filter_map(move |(number, slot)| {
                    slot.scheduled.map(|scheduled| UpcomingDose {
                        vaccine: schedule.vaccine.name.clone(),
                        dose: number,
                        scheduled,
                        days_until: (scheduled - today).whole_days(),
                    })
                })
        })
        .collect();
    upcoming.sort_by_key(|dose| dose.scheduled);
    upcoming
}
