use std::sync::LazyLock;

use regex::Regex;

use super::patterns::{
    is_canonical_code, normalize_code, number_from_text, CHOICE_EDGE_CASE_RE,
    CREDIT_POINTS_TEXT_RE, HAS_CHOICE_RE, IS_REPLACED_RE, LEVEL_POOL_RE, LOOSE_SUBJECT_CODE_RE,
    SELECTIONS_GIVEN_RE, SESSION_RE, SUBJECT_CODE_RE, YEAR_RE,
};
use super::scanner::{contains_match, match_first_of};
use crate::model::{Choices, Row, SubjectChoice, SubjectEntry, SubjectSummary};
use crate::report::{RefineLog, WarningKind};

static LEADING_INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(-?\d+)").unwrap());

/// Leading integer of a cell, as the handbook writes credit points ("10", "10cp").
pub fn parse_credit_points(cell: &str) -> Option<i32> {
    LEADING_INT_RE.captures(cell)?.get(1)?.as_str().parse().ok()
}

/// Read the entry at `cursor`: a fixed subject or an elective choice.
///
/// On return the cursor sits on the first row this entry did not consume.
/// `None` means no entry could be read from here to the end of the table.
pub fn extract_subject_entry(
    rows: &[Row],
    cursor: &mut usize,
    log: &mut RefineLog,
) -> Option<SubjectEntry> {
    let info = match_first_of(
        rows,
        &[&*HAS_CHOICE_RE, &*SUBJECT_CODE_RE, &*CHOICE_EDGE_CASE_RE],
        cursor,
    )?;

    if HAS_CHOICE_RE.is_match(info) || CHOICE_EDGE_CASE_RE.is_match(info) {
        let choices = if SELECTIONS_GIVEN_RE.is_match(info) {
            let options = enumerate_choices(rows, cursor, log);
            if options.is_empty() {
                Choices::Text(info.trim().to_string())
            } else {
                Choices::Subjects(options)
            }
        } else {
            *cursor += 1;
            Choices::Text(info.trim().to_string())
        };

        let number_to_choose = number_from_text(info).unwrap_or_else(|| {
            log.warn(
                WarningKind::ChoiceQuantity,
                format!("no quantity in {:?}, assuming 1", info.trim()),
            );
            1
        });

        return Some(SubjectEntry::Choice(SubjectChoice {
            choices,
            number_to_choose,
        }));
    }

    let summary = subject_summary(&rows[*cursor], None)?;
    let summary = get_replaced(summary, rows.get(*cursor + 1), log);
    if summary.credit_points.is_none() {
        log.warn(
            WarningKind::MissingCreditPoints,
            format!("no credit points for {}", summary.code),
        );
    }
    *cursor += 1;
    Some(SubjectEntry::Subject(summary))
}

/// Options listed under a "... of the following" row. The cursor starts on
/// that row and ends on the row that closed the list.
fn enumerate_choices(rows: &[Row], cursor: &mut usize, log: &mut RefineLog) -> Vec<SubjectSummary> {
    let shared_credit_points = rows[*cursor].get(1).and_then(|c| parse_credit_points(c));
    let mut level = None;
    let mut options = Vec::new();
    *cursor += 1;

    while let Some(row) = rows.get(*cursor) {
        if ends_choice_list(row) {
            break;
        }
        if row.iter().all(|c| c.trim().is_empty()) || contains_match(row, &[&*IS_REPLACED_RE]) {
            *cursor += 1;
            continue;
        }
        if let Some(caps) = row.iter().find_map(|c| LEVEL_POOL_RE.captures(c)) {
            level = caps[1].parse().ok();
            *cursor += 1;
            continue;
        }
        if row.len() == 2 && !contains_match(row, &[&*LOOSE_SUBJECT_CODE_RE]) {
            // TODO: resolve these against the subject list instead of a placeholder
            options.push(SubjectSummary {
                code: SubjectSummary::SPECIAL.to_string(),
                name: row[0].trim().to_string(),
                credit_points: Some(0),
                subject_level: None,
            });
            *cursor += 1;
            break;
        }

        match subject_summary(row, shared_credit_points) {
            Some(summary) => {
                let mut summary = get_replaced(summary, rows.get(*cursor + 1), log);
                if level.is_some() {
                    summary.subject_level = level;
                }
                if summary.has_valid_credit_points() {
                    options.push(summary);
                } else {
                    log.warn(
                        WarningKind::DroppedEntry,
                        format!("option {} has no usable credit points", summary.code),
                    );
                }
            }
            None => log.warn(
                WarningKind::DroppedEntry,
                format!("unreadable choice option {:?}", row),
            ),
        }
        *cursor += 1;
    }

    options
}

fn ends_choice_list(row: &[String]) -> bool {
    let credit_point_line =
        contains_match(row, &[&*CREDIT_POINTS_TEXT_RE]) && !contains_match(row, &[&*SUBJECT_CODE_RE]);
    credit_point_line || contains_match(row, &[&*YEAR_RE, &*SESSION_RE, &*HAS_CHOICE_RE])
}

/// Code, name and credit points, read from the code cell and the two after it.
fn subject_summary(row: &[String], credit_points_override: Option<i32>) -> Option<SubjectSummary> {
    let at = row
        .iter()
        .position(|c| SUBJECT_CODE_RE.is_match(c))
        .or_else(|| row.iter().position(|c| is_canonical_code(&normalize_code(c))))?;

    Some(SubjectSummary {
        code: normalize_code(&row[at]),
        name: row.get(at + 1).map(|c| c.trim().to_string()).unwrap_or_default(),
        credit_points: credit_points_override
            .or_else(|| row.get(at + 2).and_then(|c| parse_credit_points(c))),
        subject_level: None,
    })
}

/// Swap in the new code when the next row reads "OLD ... replaced by NEW".
pub fn get_replaced(
    subject: SubjectSummary,
    row_after: Option<&Row>,
    log: &mut RefineLog,
) -> SubjectSummary {
    let Some(caps) = row_after
        .and_then(|row| row.first())
        .and_then(|cell| IS_REPLACED_RE.captures(cell))
    else {
        return subject;
    };

    let old_code = normalize_code(&caps[1]);
    let new_code = normalize_code(&caps[2]);
    if old_code != subject.code {
        log.warn(
            WarningKind::UnrelatedReplacement,
            format!("{} replacement row follows {}", old_code, subject.code),
        );
        return subject;
    }

    let credit_points = row_after
        .and_then(|row| row.get(1))
        .and_then(|c| parse_credit_points(c))
        .or(subject.credit_points);

    SubjectSummary {
        name: format!("Replaces {}", old_code),
        code: new_code,
        credit_points,
        subject_level: subject.subject_level,
    }
}
