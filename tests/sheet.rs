use time::macros::date;

use vaxreport::fonts;
use vaxreport::sheet::render_compliance_sheet;
use vaxreport::source::parse_infants;
use vaxreport::timing::{analyze, upcoming_doses};

const RECORD: &str = r#"[{
    "id": 3,
    "fullName": "Maria Santos",
    "gender": "female",
    "vaccinationSchedules": [
        {
            "vaccine": { "name": "Pentavalent Vaccine", "sort": 1, "frequency": 3 },
            "firstDose": "2024-01-01",
            "secondDose": "2024-02-01",
            "thirdDose": "2024-03-01",
            "updatedFirstDose": "2024-01-04",
            "updatedSecondDose": "2024-02-01",
            "percentage": 67
        },
        {
            "vaccine": { "name": "MMR", "sort": 2, "frequency": 1 },
            "firstDose": "2024-09-01"
        }
    ]
}]"#;

#[test]
fn analysis_of_exported_record() {
    let infants = parse_infants(RECORD).unwrap();
    let analysis = analyze(&infants[0]);

    assert_eq!(analysis.doses.len(), 2);
    assert_eq!(analysis.doses[0].status.to_string(), "LATE by 3 days");
    assert_eq!(analysis.breakdown.on_time_percentage, 50);
    // (95 + 100) / 2 for the only schedule with administered doses.
    assert_eq!(analysis.overall_score, Some(97.5));

    let upcoming = upcoming_doses(&infants[0], date!(2024 - 03 - 10));
    let names: Vec<_> = upcoming.iter().map(|d| (d.vaccine.as_str(), d.dose)).collect();
    assert_eq!(names, vec![("Pentavalent Vaccine", 3), ("MMR", 1)]);
    assert!(upcoming[0].is_overdue());
}

#[test]
fn renders_compliance_sheet_when_fonts_are_available() {
    if !fonts::default_fonts_available() {
        eprintln!(
            "skipping compliance sheet rendering: fonts not found (set {})",
            fonts::FONTS_DIR_VAR
        );
        return;
    }

    let infants = parse_infants(RECORD).unwrap();
    let today = date!(2024 - 03 - 10);
    let bytes = render_compliance_sheet(
        &analyze(&infants[0]),
        &upcoming_doses(&infants[0], today),
        today,
    )
    .unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}
