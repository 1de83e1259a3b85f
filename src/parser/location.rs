use std::collections::{BTreeMap, HashMap};

use crate::model::LocationInfo;
use crate::report::{RefineLog, WarningKind};

const CAMPUS: &str = "Campus";
const ATTENDANCE: &str = "Attendance";
const MODE: &str = "Mode";
const UNKNOWN: &str = "Unknown";

/// Location rows of a program or specialisation page. The first row names
/// the columns, which may come in any order.
pub fn location_data(table: &[BTreeMap<String, String>], log: &mut RefineLog) -> Vec<LocationInfo> {
    let Some((header, rows)) = table.split_first() else {
        return Vec::new();
    };

    let columns: HashMap<&str, &str> = header
        .iter()
        .map(|(column, title)| (title.trim(), column.as_str()))
        .filter(|(title, _)| [CAMPUS, ATTENDANCE, MODE].contains(title))
        .collect();

    for field in [CAMPUS, ATTENDANCE, MODE] {
        if !columns.contains_key(field) {
            log.warn(
                WarningKind::MissingLocationField,
                format!("no {} column in location table", field),
            );
        }
    }

    let cell = |row: &BTreeMap<String, String>, field: &str| -> String {
        columns
            .get(field)
            .and_then(|column| row.get(*column))
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string()
    };

    rows.iter()
        .map(|row| LocationInfo {
            campus: cell(row, CAMPUS),
            attendance: cell(row, ATTENDANCE),
            mode: cell(row, MODE),
        })
        .collect()
}
