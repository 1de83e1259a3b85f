//! SQLite property graph of subjects, prerequisites, programs and
//! specialisations.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, Transaction};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::model::{
    Choices, ProgramSummary, Specialisation, SpecialisationType, SubjectChoice, SubjectData,
    SubjectEntry,
};
use crate::report::{RefineLog, WarningKind};

pub const PREREQUISITE_FOR: &str = "PREREQUISITE_FOR";
pub const PATHWAY_TO: &str = "PATHWAY_TO";
pub const INCLUDES_SUBJECT: &str = "INCLUDES_SUBJECT";
pub const PROVIDES_SELECTION: &str = "PROVIDES_SELECTION";
pub const INCLUDES_CHOICE: &str = "INCLUDES_CHOICE";
pub const HAS_MAJOR: &str = "HAS_MAJOR";
pub const HAS_MINOR: &str = "HAS_MINOR";

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let conn = Connection::open(path).with_context(|| format!("opening {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS nodes (
            id         INTEGER PRIMARY KEY,
            label      TEXT NOT NULL,
            key        TEXT NOT NULL,
            props      TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(label, key)
        );
        CREATE INDEX IF NOT EXISTS idx_nodes_label ON nodes(label);

        CREATE TABLE IF NOT EXISTS edges (
            src INTEGER NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
            rel TEXT NOT NULL,
            dst INTEGER NOT NULL REFERENCES nodes(id) ON DELETE CASCADE,
            UNIQUE(src, rel, dst)
        );
        CREATE INDEX IF NOT EXISTS idx_edges_dst ON edges(dst, rel);
        ",
    )?;
    Ok(())
}

pub fn clear(conn: &Connection) -> Result<()> {
    conn.execute_batch("DELETE FROM edges; DELETE FROM nodes;")?;
    Ok(())
}

/// Insert the node or merge `props` into the existing one. Returns its id.
pub fn merge_node(conn: &Connection, label: &str, key: &str, props: &Value) -> Result<i64> {
    let id = conn.query_row(
        "INSERT INTO nodes (label, key, props) VALUES (?1, ?2, ?3)
         ON CONFLICT(label, key) DO UPDATE SET props = json_patch(nodes.props, excluded.props)
         RETURNING id",
        params![label, key, props.to_string()],
        |r| r.get(0),
    )?;
    Ok(id)
}

pub fn link(conn: &Connection, src: i64, rel: &str, dst: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO edges (src, rel, dst) VALUES (?1, ?2, ?3)",
        params![src, rel, dst],
    )?;
    Ok(())
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadCounts {
    pub subjects: usize,
    pub prerequisites: usize,
    pub programs: usize,
    pub specialisations: usize,
}

/// Replace the graph with the refined subjects and programs.
pub fn load_graph(
    conn: &Connection,
    subjects: &[SubjectData],
    programs: &[ProgramSummary],
    log: &mut RefineLog,
) -> Result<LoadCounts> {
    let tx = conn.unchecked_transaction()?;
    clear(&tx)?;

    let mut counts = LoadCounts::default();
    let known = load_subjects(&tx, subjects, &mut counts, log)?;
    for program in programs {
        load_program(&tx, program, &known, &mut counts, log)?;
    }

    tx.commit()?;
    info!(
        subjects = counts.subjects,
        prerequisites = counts.prerequisites,
        programs = counts.programs,
        specialisations = counts.specialisations,
        "Graph loaded"
    );
    Ok(counts)
}

fn load_subjects(
    tx: &Transaction,
    subjects: &[SubjectData],
    counts: &mut LoadCounts,
    log: &mut RefineLog,
) -> Result<HashSet<String>> {
    let mut known = HashSet::new();

    for subject in subjects {
        let Some(code) = subject.code.as_deref() else {
            log.warn(
                WarningKind::InvalidSubjectCode,
                format!("no code for {:?}, not loaded", subject.subject.as_deref().unwrap_or("")),
            );
            continue;
        };
        let props = json!({
            "subjectName": subject.subject,
            "creditPoints": subject.credit_points,
            "coordinator": subject.coordinator,
            "description": subject.description,
            "school": subject.school,
            "discipline": subject.discipline,
            "subjectLink": subject.link,
            "prerequisites": subject.original_prerequisites,
        });
        merge_node(tx, "Subject", code, &props)?;
        known.insert(code.to_string());
        counts.subjects += 1;
    }

    // Second pass so prerequisite codes resolve to subjects loaded above.
    for subject in subjects {
        let Some(code) = subject.code.as_deref() else {
            continue;
        };
        let target = merge_node(tx, "Subject", code, &json!({}))?;
        for prerequisite in subject.logical_prerequisites() {
            let groups = serde_json::to_string(&prerequisite.and)?;
            let key = format!("{}|{}|{}", code, prerequisite.course, groups);
            let node = merge_node(
                tx,
                "Prerequisites",
                &key,
                &json!({ "course": prerequisite.course, "subjects": groups }),
            )?;
            link(tx, node, PATHWAY_TO, target)?;
            for required in prerequisite.codes() {
                let source = merge_node(tx, "Subject", required, &json!({}))?;
                link(tx, source, PREREQUISITE_FOR, node)?;
            }
            counts.prerequisites += 1;
        }
    }

    Ok(known)
}

fn load_program(
    tx: &Transaction,
    program: &ProgramSummary,
    known: &HashSet<String>,
    counts: &mut LoadCounts,
    log: &mut RefineLog,
) -> Result<()> {
    let id = merge_node(
        tx,
        "Program",
        &program.name,
        &json!({
            "programName": program.name,
            "programLink": program.link,
            "locations": program.locations,
        }),
    )?;

    let entries = program
        .sequences
        .iter()
        .flat_map(|s| &s.sequence)
        .flat_map(|y| &y.sessions)
        .flat_map(|s| &s.subjects);
    for entry in entries {
        add_entry(tx, id, &program.name, entry, known, log)?;
    }

    let attached = [(program.majors.as_deref(), HAS_MAJOR), (program.minors.as_deref(), HAS_MINOR)];
    for (specialisations, rel) in attached {
        for specialisation in specialisations.unwrap_or_default() {
            let node = add_specialisation(tx, specialisation, known, log)?;
            link(tx, id, rel, node)?;
            counts.specialisations += 1;
        }
    }

    counts.programs += 1;
    debug!(program = %program.name, "loaded");
    Ok(())
}

fn add_specialisation(
    tx: &Transaction,
    specialisation: &Specialisation,
    known: &HashSet<String>,
    log: &mut RefineLog,
) -> Result<i64> {
    let label = match specialisation.kind {
        SpecialisationType::Minor => "Minor",
        _ => "Major",
    };
    let id = merge_node(
        tx,
        label,
        &specialisation.name,
        &json!({
            "name": specialisation.name,
            "type": specialisation.kind.as_str(),
            "link": specialisation.link,
            "locations": specialisation.locations,
        }),
    )?;
    for entry in &specialisation.subjects {
        add_entry(tx, id, &specialisation.name, entry, known, log)?;
    }
    Ok(id)
}

fn add_entry(
    tx: &Transaction,
    parent: i64,
    parent_key: &str,
    entry: &SubjectEntry,
    known: &HashSet<String>,
    log: &mut RefineLog,
) -> Result<()> {
    match entry {
        SubjectEntry::Subject(subject) => {
            let node = merge_node(tx, "Subject", &subject.code, &json!({}))?;
            link(tx, parent, INCLUDES_SUBJECT, node)?;
        }
        SubjectEntry::Choice(choice) => add_choice(tx, parent, parent_key, choice, known, log)?,
    }
    Ok(())
}

fn add_choice(
    tx: &Transaction,
    parent: i64,
    parent_key: &str,
    choice: &SubjectChoice,
    known: &HashSet<String>,
    log: &mut RefineLog,
) -> Result<()> {
    let options = serde_json::to_string(&choice.choices)?;
    let id = merge_node(
        tx,
        "SubjectChoice",
        &format!("{}|{}", parent_key, options),
        &json!({
            "choiceName": options,
            "choices": choice.number_to_choose,
            "parent": parent_key,
        }),
    )?;
    link(tx, parent, PROVIDES_SELECTION, id)?;

    if let Choices::Subjects(subjects) = &choice.choices {
        for subject in subjects {
            if known.contains(&subject.code) {
                let node = merge_node(tx, "Subject", &subject.code, &json!({}))?;
                link(tx, id, INCLUDES_CHOICE, node)?;
            } else {
                log.warn(
                    WarningKind::UnknownSubject,
                    format!("{} offered by {} is not a loaded subject", subject.code, parent_key),
                );
            }
        }
    }
    Ok(())
}

pub struct GraphStats {
    pub labels: Vec<(String, usize)>,
    pub relations: Vec<(String, usize)>,
}

pub fn get_stats(conn: &Connection) -> Result<GraphStats> {
    let counts = |sql: &str| -> Result<Vec<(String, usize)>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    };
    Ok(GraphStats {
        labels: counts("SELECT label, COUNT(*) FROM nodes GROUP BY label ORDER BY label")?,
        relations: counts("SELECT rel, COUNT(*) FROM edges GROUP BY rel ORDER BY rel")?,
    })
}
