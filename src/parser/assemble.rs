use super::location::location_data;
use super::patterns::{clean_title, specialisation_type, TOTAL_CREDIT_POINTS_RE};
use super::scanner::row_matches;
use super::segment::{extract_specialisation_data, extract_year};
use super::ParseError;
use crate::model::{
    MajorMinorData, ProgramData, ProgramLinkData, ProgramSummary, Row, Sequence, Specialisation,
};
use crate::report::{RefineLog, WarningKind};

/// Name of the table holding a page's recommended sequence.
pub const STRUCTURE_TABLE: &str = "structure";

/// Refine one scraped program. Majors and minors are attached later.
pub fn refine_program(data: &ProgramData, log: &mut RefineLog) -> Result<ProgramSummary, ParseError> {
    let mut sequences = Vec::new();
    for rows in sequence_tables(&data.sequence) {
        read_sequences(rows, &mut sequences, log)?;
    }

    Ok(ProgramSummary {
        name: clean_title(&data.name),
        link: data.original_link.clone(),
        sequences,
        locations: location_data(&data.locations, log),
        majors: None,
        minors: None,
    })
}

/// `"structure"` first, then the remaining tables by name.
fn sequence_tables<'a>(
    tables: &'a std::collections::BTreeMap<String, Vec<Row>>,
) -> impl Iterator<Item = &'a Vec<Row>> {
    tables
        .get(STRUCTURE_TABLE)
        .into_iter()
        .chain(tables.iter().filter(|(name, _)| *name != STRUCTURE_TABLE).map(|(_, rows)| rows))
}

/// Each run of years closed by a "total credit points" row is one sequence.
fn read_sequences(rows: &[Row], out: &mut Vec<Sequence>, log: &mut RefineLog) -> Result<(), ParseError> {
    let mut cursor = 0;

    while cursor + 1 < rows.len() {
        let mut years = Vec::new();
        let mut exhausted = false;

        while cursor < rows.len() && !row_matches(rows, cursor, &[&*TOTAL_CREDIT_POINTS_RE]) {
            match extract_year(rows, &mut cursor, log)? {
                Some(year) => years.push(year),
                None => {
                    exhausted = true;
                    break;
                }
            }
        }

        if years.is_empty() {
            log.warn(
                WarningKind::EmptySequence,
                format!("no years before row {}", cursor),
            );
        } else {
            out.push(Sequence {
                name: format!("Sequence {}", out.len() + 1),
                sequence: years,
            });
        }

        if exhausted {
            break;
        }
        cursor += 1;
    }

    Ok(())
}

/// Refine one scraped major or minor. `None` when the page has no table.
pub fn refine_specialisation(
    data: &MajorMinorData,
    log: &mut RefineLog,
) -> Result<Option<Specialisation>, ParseError> {
    let rows = data
        .sequences
        .get(STRUCTURE_TABLE)
        .or_else(|| data.sequences.values().next());
    let Some(rows) = rows.filter(|rows| !rows.is_empty()) else {
        return Ok(None);
    };

    let name = clean_title(&data.name);
    let kind = data.kind.unwrap_or_else(|| specialisation_type(&name));
    let subjects = extract_specialisation_data(rows, &mut 0, log)?;

    Ok(Some(Specialisation {
        name,
        kind,
        subjects,
        link: data.original_link.clone(),
        locations: location_data(&data.locations, log),
    }))
}

/// Attach the refined majors and minors the program page links to.
pub fn attach_specialisations(
    program: &mut ProgramSummary,
    links: Option<&ProgramLinkData>,
    majors: &[Specialisation],
    minors: &[Specialisation],
) {
    let linked = |wanted: Option<&Vec<String>>, pool: &[Specialisation]| -> Vec<Specialisation> {
        pool.iter()
            .filter(|s| wanted.is_some_and(|links| links.contains(&s.link)))
            .cloned()
            .collect()
    };
    program.majors = Some(linked(links.map(|l| &l.majors), majors));
    program.minors = Some(linked(links.map(|l| &l.minors), minors));
}
