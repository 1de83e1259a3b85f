mod db;
mod files;
mod links;
mod model;
mod parser;
mod pipeline;
mod report;
mod settings;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use model::{MajorMinorData, ProgramData, ProgramSummary, SubjectData};
use pipeline::RefineInput;
use report::{RefineLog, RefineReport};
use settings::Settings;

const PROGRAMS_IN: &str = "programs-unrefined.json";
const MAJORS_IN: &str = "programMajorData.json";
const MINORS_IN: &str = "programMinorData.json";
const SUBJECTS_IN: &str = "subjects-unrefined.json";
const PROGRAMS_OUT: &str = "programs-refined.json";
const SUBJECTS_OUT: &str = "subjects-refined.json";
const REPORT_OUT: &str = "refine-report.json";
const SPECIALISATION_SUBJECTS_OUT: &str = "majorMinorSubjectLinks.json";
const MISSING_LINKS_OUT: &str = "missing-links.json";

#[derive(Parser)]
#[command(name = "hbook_refiner", about = "Refine scraped handbook pages into curriculum data")]
struct Cli {
    /// Directory holding the scraped JSON artifacts
    #[arg(long, global = true)]
    input_dir: Option<PathBuf>,
    /// Directory for refined artifacts
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    /// Graph database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Log every parse warning as it happens
    #[arg(long, global = true)]
    show_warnings: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refine programs, majors and minors
    Refine,
    /// Normalize subject prerequisites
    Prereqs,
    /// Collect related subject, major and minor links
    Links {
        /// File name prefix for the link lists
        #[arg(short, long, default_value = "related")]
        prefix: String,
    },
    /// Load refined programs and subjects into the graph store
    Load,
    /// Refine + prereqs + load in one pipeline
    Run,
    /// Show graph store statistics
    Stats,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;
    if let Some(dir) = cli.input_dir {
        settings.input_dir = dir;
    }
    if let Some(dir) = cli.output_dir {
        settings.output_dir = dir;
    }
    if let Some(path) = cli.db {
        settings.db_path = path;
    }
    settings.show_warnings |= cli.show_warnings;
    info!(settings = ?settings, "Starting handbook refiner");

    let result = match cli.command {
        Commands::Refine => {
            let mut report = RefineReport::new();
            refine(&settings, &mut report)?;
            finish_report(&settings, report)
        }
        Commands::Prereqs => {
            let mut report = RefineReport::new();
            prereqs(&settings, &mut report)?;
            finish_report(&settings, report)
        }
        Commands::Links { prefix } => {
            let programs: Vec<ProgramData> = files::read_json(&settings.input(PROGRAMS_IN))?;
            let related = links::related_links(&programs);
            files::write_json(&settings.output(&format!("{}Subjects.json", prefix)), &related.subjects)?;
            files::write_json(&settings.output(&format!("{}Majors.json", prefix)), &related.majors)?;
            files::write_json(&settings.output(&format!("{}Minors.json", prefix)), &related.minors)?;

            let mut pages: Vec<MajorMinorData> = files::read_json_list(&settings.input(MAJORS_IN))?;
            pages.extend(files::read_json_list::<MajorMinorData>(&settings.input(MINORS_IN))?);
            let subject_links = links::specialisation_subject_links(&pages);
            files::write_json(&settings.output(SPECIALISATION_SUBJECTS_OUT), &subject_links)?;

            let refined: Vec<SubjectData> = files::read_json_list(&settings.output(SUBJECTS_OUT))?;
            let missing = links::missing_subject_links(&refined, &related.subjects);
            files::write_json(&settings.output(MISSING_LINKS_OUT), &missing)?;

            println!(
                "{} related links ({} subjects, {} majors, {} minors), {} major/minor subject links, {} missing prerequisite subjects",
                related.total(),
                related.subjects.len(),
                related.majors.len(),
                related.minors.len(),
                subject_links.len(),
                missing.len()
            );
            Ok(())
        }
        Commands::Load => {
            let programs: Vec<ProgramSummary> = files::read_json(&settings.output(PROGRAMS_OUT))?;
            let subjects: Vec<SubjectData> = files::read_json(&settings.output(SUBJECTS_OUT))?;
            load(&settings, &subjects, &programs)
        }
        Commands::Run => {
            let mut report = RefineReport::new();
            let programs = refine(&settings, &mut report)?;
            let subjects = prereqs(&settings, &mut report)?;
            finish_report(&settings, report)?;
            load(&settings, &subjects, &programs)
        }
        Commands::Stats => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let stats = db::get_stats(&conn)?;
            if stats.labels.is_empty() {
                println!("Graph is empty. Run 'load' first.");
                return Ok(());
            }
            println!("{:<16} | {:>7}", "Label", "Nodes");
            println!("{}", "-".repeat(26));
            for (label, n) in &stats.labels {
                println!("{:<16} | {:>7}", label, n);
            }
            println!();
            println!("{:<20} | {:>7}", "Relation", "Edges");
            println!("{}", "-".repeat(30));
            for (rel, n) in &stats.relations {
                println!("{:<20} | {:>7}", rel, n);
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn refine(settings: &Settings, report: &mut RefineReport) -> Result<Vec<ProgramSummary>> {
    let programs: Vec<ProgramData> = files::read_json(&settings.input(PROGRAMS_IN))?;
    let majors: Vec<MajorMinorData> = files::read_json_list(&settings.input(MAJORS_IN))?;
    let minors: Vec<MajorMinorData> = files::read_json_list(&settings.input(MINORS_IN))?;
    println!(
        "Refining {} programs, {} majors, {} minors...",
        programs.len(),
        majors.len(),
        minors.len()
    );

    let refined = pipeline::refine_programs(
        RefineInput {
            programs: &programs,
            majors: &majors,
            minors: &minors,
        },
        settings.chunk_size,
        settings.show_warnings,
        report,
    );
    files::write_json(&settings.output(PROGRAMS_OUT), &refined)?;
    Ok(refined)
}

fn prereqs(settings: &Settings, report: &mut RefineReport) -> Result<Vec<SubjectData>> {
    let subjects: Vec<SubjectData> = files::read_json(&settings.input(SUBJECTS_IN))?;
    println!("Normalizing prerequisites of {} subjects...", subjects.len());
    let refined = pipeline::refine_subjects(subjects, settings.show_warnings, report);
    files::write_json(&settings.output(SUBJECTS_OUT), &refined)?;
    Ok(refined)
}

fn load(settings: &Settings, subjects: &[SubjectData], programs: &[ProgramSummary]) -> Result<()> {
    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;
    let mut log = RefineLog::new("graph load").loud(settings.show_warnings);
    let counts = db::load_graph(&conn, subjects, programs, &mut log)?;
    println!(
        "Loaded {} subjects, {} prerequisite sets, {} programs, {} majors/minors ({} warnings).",
        counts.subjects,
        counts.prerequisites,
        counts.programs,
        counts.specialisations,
        log.warnings().len()
    );
    Ok(())
}

fn finish_report(settings: &Settings, mut report: RefineReport) -> Result<()> {
    report.finish();
    report.print();
    files::write_json(&settings.output(REPORT_OUT), &report)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
