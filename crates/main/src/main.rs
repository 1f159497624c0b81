use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use time::{Date, OffsetDateTime};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vaxreport::model::parse_date;
use vaxreport::sheet::render_compliance_sheet;
use vaxreport::summary::{stat_line, summary_line};
use vaxreport::timing::{analyze, upcoming_doses};
use vaxreport::{
    coverage_summary, generate_report, render_pdf, Gender, InfantSource, JsonFileSource,
    RecordingCanvas, ReportFilter, ReportMode, ReportRequest, ReportSettings, YearMonth,
};

/// Generates immunization coverage reports from an exported infant list.
#[derive(Parser)]
#[command(author, version, about = "Immunization coverage reports")]
struct Cli {
    /// TOML settings file (page size, table styling, layout presets).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `vaxreport=debug`. Falls back to RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the coverage report PDF.
    Report(ReportArgs),

    /// Print per-vaccine completion figures.
    Summary(SummaryArgs),

    /// Analyze the dose timing of one infant.
    Timing(TimingArgs),
}

#[derive(Args)]
struct FilterArgs {
    /// Only this vaccine.
    #[arg(long)]
    vaccine: Option<String>,

    /// Only infants living in this baranggay.
    #[arg(long)]
    baranggay: Option<String>,
}

#[derive(Args)]
struct ReportArgs {
    /// JSON export of the infant list.
    #[arg(long)]
    input: PathBuf,

    /// `all` (completion per vaccine) or `monthly` (doses grouped by month).
    #[arg(long, default_value = "all", value_parser = parse_mode)]
    mode: ReportMode,

    #[command(flatten)]
    filter: FilterArgs,

    /// Only infants of this sex.
    #[arg(long)]
    gender: Option<String>,

    /// Month of administration (YYYY-MM), monthly mode only.
    #[arg(long, value_parser = parse_month)]
    month: Option<YearMonth>,

    /// Report date (YYYY-MM-DD); defaults to today.
    #[arg(long, value_parser = parse_day)]
    date: Option<Date>,

    /// Directory the PDF is written to.
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Lay the report out without writing a file.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct SummaryArgs {
    #[arg(long)]
    input: PathBuf,

    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Args)]
struct TimingArgs {
    #[arg(long)]
    input: PathBuf,

    /// Record ID of the infant.
    #[arg(long)]
    infant: String,

    /// Also render the compliance sheet to this file.
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Reference date for upcoming doses (YYYY-MM-DD); defaults to today.
    #[arg(long, value_parser = parse_day)]
    today: Option<Date>,
}

fn parse_mode(raw: &str) -> std::result::Result<ReportMode, String> {
    raw.parse().map_err(|err: vaxreport::ReportError| err.to_string())
}

fn parse_day(raw: &str) -> std::result::Result<Date, String> {
    parse_date(raw).map_err(|err| err.to_string())
}

fn parse_month(raw: &str) -> std::result::Result<YearMonth, String> {
    YearMonth::parse(raw).map_err(|err| err.to_string())
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_settings(path: Option<&PathBuf>) -> Result<ReportSettings> {
    match path {
        Some(path) => ReportSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(ReportSettings::default()),
    }
}

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

impl FilterArgs {
    fn to_filter(&self) -> ReportFilter {
        ReportFilter {
            vaccine: self.vaccine.clone(),
            baranggay: self.baranggay.clone(),
            ..ReportFilter::default()
        }
    }
}

fn run_report(args: ReportArgs, settings: &ReportSettings) -> Result<()> {
    let source = JsonFileSource::new(&args.input);
    let mut filter = args.filter.to_filter();
    filter.gender = args.gender.as_deref().map(Gender::from);
    filter.month = args.month;

    let request = ReportRequest::new(args.mode)
        .with_filter(filter)
        .with_date(args.date.unwrap_or_else(today));

    if args.dry_run {
        let report = generate_report(&source, &request, settings, RecordingCanvas::new())
            .context("laying out report")?;
        println!(
            "{}: {} page(s), {} row(s)",
            report.file_name, report.pages, report.rows
        );
        for landmark in &report.landmarks {
            println!("  p{:<3} {}", landmark.page, landmark.title);
        }
        return Ok(());
    }

    let report = render_pdf(&source, &request, settings).context("rendering report")?;
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;
    let path = args.out.join(&report.file_name);
    std::fs::write(&path, &report.bytes)
        .with_context(|| format!("writing {}", path.display()))?;
    info!("wrote {} ({} page(s))", path.display(), report.pages);
    Ok(())
}

fn run_summary(args: SummaryArgs, settings: &ReportSettings) -> Result<()> {
    let source = JsonFileSource::new(&args.input);
    let coverage =
        coverage_summary(&source, &args.filter.to_filter()).context("summarizing records")?;
    let threshold = settings.layout.abbreviation_threshold;

    println!("Infants included: {}", coverage.infants);
    if coverage.summaries.is_empty() {
        println!("No vaccination records match the selected filters.");
        return Ok(());
    }
    for summary in &coverage.summaries {
        println!("{}", summary_line(summary, threshold));
    }
    println!();
    println!("Recorded completion:");
    for stat in &coverage.stats {
        println!("  {}", stat_line(stat, threshold));
    }
    Ok(())
}

fn run_timing(args: TimingArgs) -> Result<()> {
    let source = JsonFileSource::new(&args.input);
    let infants = source.fetch_all_infants().context("loading records")?;
    let infant = infants
        .iter()
        .find(|infant| infant.id == args.infant)
        .ok_or_else(|| anyhow!("no infant with id {}", args.infant))?;

    let today = args.today.unwrap_or_else(today);
    let analysis = analyze(infant);
    let upcoming = upcoming_doses(infant, today);

    println!("{} ({})", analysis.infant_name, analysis.infant_id);
    for dose in &analysis.doses {
        println!(
            "  {} dose {}: {} (score {})",
            dose.vaccine, dose.dose, dose.status, dose.score
        );
    }
    let breakdown = &analysis.breakdown;
    println!(
        "On time {}%, early {}%, late {}%, average deviation {} day(s)",
        breakdown.on_time_percentage,
        breakdown.early_percentage,
        breakdown.late_percentage,
        breakdown.average_deviation_days
    );
    match analysis.overall_score {
        Some(score) => println!("Compliance score: {:.1}", score),
        None => println!("Compliance score: n/a"),
    }
    for dose in &upcoming {
        println!(
            "  upcoming {} dose {} on {} ({} day(s))",
            dose.vaccine, dose.dose, dose.scheduled, dose.days_until
        );
    }

    if let Some(path) = args.pdf {
        let bytes = render_compliance_sheet(&analysis, &upcoming, today)
            .context("rendering compliance sheet")?;
        std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
        info!("wrote {}", path.display());
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(cli.config.as_ref())?;
    match cli.command {
        Commands::Report(args) => run_report(args, &settings),
        Commands::Summary(args) => run_summary(args, &settings),
        Commands::Timing(args) => run_timing(args),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    if let Err(err) = run(cli) {
        error!("{}", err);
        for cause in err.chain().skip(1) {
            error!("  caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
