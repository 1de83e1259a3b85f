use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::info;

use crate::model::{MajorMinorData, ProgramData, ProgramSummary, Specialisation, SubjectData};
use crate::parser::patterns::clean_title;
use crate::parser::{self, ParseError};
use crate::report::{RefineLog, RefineReport, Tally};

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Refine every item of `items` in parallel chunks, one log per item.
/// Results come back in input order.
fn refine_chunked<T, R, F>(
    items: &[T],
    chunk_size: usize,
    show_warnings: bool,
    name: fn(&T) -> &str,
    refine: F,
) -> Vec<(Result<R, ParseError>, RefineLog)>
where
    T: Sync,
    R: Send,
    F: Fn(&T, &mut RefineLog) -> Result<R, ParseError> + Sync,
{
    let pb = progress_bar(items.len());
    let mut out = Vec::with_capacity(items.len());

    for chunk in items.chunks(chunk_size.max(1)) {
        let results: Vec<_> = chunk
            .par_iter()
            .map(|item| {
                let mut log = RefineLog::new(clean_title(name(item))).loud(show_warnings);
                let result = refine(item, &mut log);
                (result, log)
            })
            .collect();
        out.extend(results);
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    out
}

fn collect<T>(
    results: Vec<(Result<Option<T>, ParseError>, RefineLog)>,
    tally: &mut Tally,
    report: &mut RefineReport,
) -> Vec<T> {
    let mut refined = Vec::new();
    for (result, log) in results {
        match result {
            Ok(Some(item)) => {
                tally.parsed += 1;
                refined.push(item);
            }
            Ok(None) => tally.skipped += 1,
            Err(e) => {
                tally.skipped += 1;
                report.fail(log.context(), e);
            }
        }
        report.absorb(log);
    }
    refined
}

fn program_name(data: &ProgramData) -> &str {
    &data.name
}

fn specialisation_name(data: &MajorMinorData) -> &str {
    &data.name
}

pub struct RefineInput<'a> {
    pub programs: &'a [ProgramData],
    pub majors: &'a [MajorMinorData],
    pub minors: &'a [MajorMinorData],
}

/// Refine programs, majors and minors, then attach each program's majors
/// and minors. A program or specialisation that fails to parse is skipped
/// and recorded in the report.
pub fn refine_programs(
    input: RefineInput<'_>,
    chunk_size: usize,
    show_warnings: bool,
    report: &mut RefineReport,
) -> Vec<ProgramSummary> {
    let specialisations = |pages: &[MajorMinorData], tally: &mut Tally, report: &mut RefineReport| {
        let results = refine_chunked(
            pages,
            chunk_size,
            show_warnings,
            specialisation_name,
            parser::refine_specialisation,
        );
        collect::<Specialisation>(results, tally, report)
    };

    info!("Refining {} majors", input.majors.len());
    let mut tally = Tally::default();
    let majors = specialisations(input.majors, &mut tally, report);
    report.majors = tally;

    info!("Refining {} minors", input.minors.len());
    let mut tally = Tally::default();
    let minors = specialisations(input.minors, &mut tally, report);
    report.minors = tally;

    info!("Refining {} programs", input.programs.len());
    let results = refine_chunked(
        input.programs,
        chunk_size,
        show_warnings,
        program_name,
        |data, log| parser::refine_program(data, log).map(Some),
    );
    let mut tally = Tally::default();
    let mut programs = collect(results, &mut tally, report);
    report.programs = tally;

    // Programs line up with their input only once failures are removed, so
    // look links up by page link.
    for program in &mut programs {
        let links = input
            .programs
            .iter()
            .find(|p| p.original_link == program.link)
            .and_then(|p| p.links.as_ref());
        parser::attach_specialisations(program, links, &majors, &minors);
    }

    programs
}

/// Normalize prerequisites of every subject page.
pub fn refine_subjects(
    subjects: Vec<SubjectData>,
    show_warnings: bool,
    report: &mut RefineReport,
) -> Vec<SubjectData> {
    info!("Refining {} subjects", subjects.len());
    let pb = progress_bar(subjects.len());

    let results: Vec<(SubjectData, RefineLog)> = subjects
        .into_par_iter()
        .map(|subject| {
            let context = subject.subject.clone().unwrap_or_default();
            let mut log = RefineLog::new(clean_title(&context)).loud(show_warnings);
            let refined = parser::refine_subject(subject, &mut log);
            pb.inc(1);
            (refined, log)
        })
        .collect();
    pb.finish_and_clear();

    let mut refined = Vec::with_capacity(results.len());
    for (subject, log) in results {
        if subject.code.is_some() {
            report.subjects.parsed += 1;
        } else {
            report.subjects.skipped += 1;
        }
        report.absorb(log);
        refined.push(subject);
    }
    refined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::read_json;
    use crate::report::WarningKind;
    use std::path::Path;

    fn fixture<T: serde::de::DeserializeOwned>(name: &str) -> T {
        read_json(&Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)).unwrap()
    }

    #[test]
    fn refines_fixture_set() {
        let programs: Vec<ProgramData> = fixture("programs-unrefined.json");
        let majors: Vec<MajorMinorData> = fixture("programMajorData.json");
        let minors: Vec<MajorMinorData> = fixture("programMinorData.json");

        let mut report = RefineReport::new();
        let refined = refine_programs(
            RefineInput {
                programs: &programs,
                majors: &majors,
                minors: &minors,
            },
            1,
            false,
            &mut report,
        );

        assert_eq!(refined.len(), 1);
        assert_eq!(report.programs.parsed, 1);
        assert_eq!(report.programs.skipped, 1);
        assert_eq!(report.failures[0].item, "Bachelor of Data Science");
        assert_eq!(report.majors.parsed, 2);
        assert_eq!(report.majors.skipped, 1);
        assert_eq!(report.minors.parsed, 1);

        let program = &refined[0];
        assert_eq!(program.majors.as_ref().map(Vec::len), Some(1));
        assert_eq!(program.minors.as_ref().map(Vec::len), Some(0));
    }

    #[test]
    fn log_context_is_the_clean_title() {
        fn as_name<'a>(name: &'a &str) -> &'a str {
            name
        }
        let names = ["Cyber Security, Major\t\t(M3001)", "  Bachelor of Arts"];
        let results = refine_chunked(&names, 1, false, as_name, |_, log| {
            log.warn(WarningKind::ChoiceQuantity, "assumed 1");
            Ok(())
        });
        let contexts: Vec<&str> = results.iter().map(|(_, log)| log.context()).collect();
        assert_eq!(contexts, ["Cyber Security, Major", "Bachelor of Arts"]);
        assert_eq!(results[0].1.warnings()[0].context, "Cyber Security, Major");
    }

    #[test]
    fn refines_subjects() {
        let subjects: Vec<SubjectData> = fixture("subjects-unrefined.json");
        let mut report = RefineReport::new();
        let refined = refine_subjects(subjects, false, &mut report);

        assert_eq!(refined.len(), 4);
        assert_eq!(report.subjects.parsed, 3);
        assert_eq!(report.subjects.skipped, 1);
        assert!(refined[0].logical_prerequisites().is_empty());
        assert_eq!(refined[1].logical_prerequisites()[0].codes().collect::<Vec<_>>(), ["COMP 1010"]);
        assert_eq!(refined[2].code.as_deref(), Some("COMP 2020"));
        assert_eq!(refined[2].logical_prerequisites()[0].and.len(), 2);
        assert_eq!(refined[3].logical_prerequisites()[0].course, "SPECIAL");
    }
}
