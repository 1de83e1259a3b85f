//! Year and session blocks.
//!
//! A year runs from its header to the next year header or "total credit
//! points" row; a session runs from its header to the next session, year
//! or total row. Boundary rows are never consumed here.

use regex::Regex;

use super::extract::extract_subject_entry;
use super::patterns::{
    number_from_text, session_type, CHOICE_EDGE_CASE_RE, HAS_CHOICE_RE, IS_REPLACED_RE,
    SESSION_RE, SUBJECT_CODE_RE, TOTAL_CREDIT_POINTS_RE, YEAR_NUMBER_RE, YEAR_RE,
};
use super::scanner::{contains_match, match_next, row_matches};
use super::ParseError;
use crate::model::{Row, Session, SubjectEntry, Year};
use crate::report::{RefineLog, WarningKind};

/// Next year block from `cursor`, or `None` once no year header is left.
pub fn extract_year(
    rows: &[Row],
    cursor: &mut usize,
    log: &mut RefineLog,
) -> Result<Option<Year>, ParseError> {
    let Some(header) = match_next(rows, &YEAR_RE, cursor) else {
        return Ok(None);
    };
    let start = *cursor;
    let year = year_number(header).ok_or_else(|| ParseError::YearNumber {
        header: header.trim().to_string(),
        row: start,
    })?;
    *cursor += 1;

    let mut sessions = Vec::new();
    while *cursor < rows.len() && !row_matches(rows, *cursor, &[&*TOTAL_CREDIT_POINTS_RE, &*YEAR_RE]) {
        if row_matches(rows, *cursor, &[&*SESSION_RE]) {
            sessions.push(extract_session(rows, cursor, log)?);
        } else {
            *cursor += 1;
        }
    }

    if sessions.is_empty() {
        return Err(ParseError::NoSessions { year, row: start });
    }
    Ok(Some(Year { year, sessions }))
}

fn year_number(header: &str) -> Option<u32> {
    YEAR_NUMBER_RE
        .captures(header)
        .and_then(|caps| caps[1].parse().ok())
        .or_else(|| number_from_text(header))
}

pub fn extract_session(
    rows: &[Row],
    cursor: &mut usize,
    log: &mut RefineLog,
) -> Result<Session, ParseError> {
    let header = match_next(rows, &SESSION_RE, cursor)
        .ok_or(ParseError::MissingSessionHeader { row: *cursor })?;
    let session_type = session_type(header);
    let start = *cursor;
    *cursor += 1;

    let subjects = collect_entries(
        rows,
        cursor,
        &[&*TOTAL_CREDIT_POINTS_RE, &*YEAR_RE, &*SESSION_RE],
        log,
    );
    if subjects.is_empty() {
        return Err(ParseError::NoSubjects { block: "session", row: start });
    }
    Ok(Session { session_type, subjects })
}

/// Entries of a major/minor table, which has no year or session headers.
pub fn extract_specialisation_data(
    rows: &[Row],
    cursor: &mut usize,
    log: &mut RefineLog,
) -> Result<Vec<SubjectEntry>, ParseError> {
    let start = *cursor;
    let subjects = collect_entries(rows, cursor, &[&*TOTAL_CREDIT_POINTS_RE], log);
    if subjects.is_empty() {
        return Err(ParseError::NoSubjects { block: "specialisation", row: start });
    }
    Ok(subjects)
}

fn collect_entries(
    rows: &[Row],
    cursor: &mut usize,
    boundaries: &[&Regex],
    log: &mut RefineLog,
) -> Vec<SubjectEntry> {
    let mut entries = Vec::new();

    while *cursor < rows.len() && !row_matches(rows, *cursor, boundaries) {
        let row = &rows[*cursor];
        // Replacement rows belong to the subject above them.
        if !contains_match(row, &[&*SUBJECT_CODE_RE, &*HAS_CHOICE_RE, &*CHOICE_EDGE_CASE_RE])
            || contains_match(row, &[&*IS_REPLACED_RE])
        {
            *cursor += 1;
            continue;
        }

        let at = *cursor;
        match extract_subject_entry(rows, cursor, log) {
            Some(SubjectEntry::Subject(subject)) if !subject.has_valid_credit_points() => {
                log.warn(
                    WarningKind::DroppedEntry,
                    format!("{} dropped for missing or negative credit points", subject.code),
                );
            }
            Some(entry) => entries.push(entry),
            None => {
                log.warn(
                    WarningKind::DroppedEntry,
                    format!("unreadable entry at row {}, ending block", at),
                );
                break;
            }
        }
    }

    entries
}
