use std::sync::LazyLock;

use regex::Regex;

use crate::model::{SessionType, SpecialisationType};

// Handbook cells carry non-breaking spaces; `\s` matches them.

pub static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:year\s+(?:\d{1,2}|one|two|three|four|five|six)\b|\d{1,2}(?:st|nd|rd|th)\s+year\b)").unwrap()
});
pub static YEAR_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{1,2})").unwrap());
pub static TOTAL_CREDIT_POINTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\btotal\s+credit\s+points?\b").unwrap());
pub static CREDIT_POINTS_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcredit\s+points?\b").unwrap());
pub static SESSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:(?:autumn|spring|summer|winter)\b.*\b(?:session|term|school)\b|(?:trimester|semester|term|quarter)\s+\d+\b|\d(?:st|nd|rd|th)?\s+(?:half|semester|trimester|term)\b|[\w ]{0,24}\bsession\s*$)",
    )
    .unwrap()
});

pub static SUBJECT_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[A-Z]{4}\s\d{4}\s*$").unwrap());
pub static LOOSE_SUBJECT_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]{4}\s?\d{4}").unwrap());
pub static CANONICAL_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{4} \d{4}$").unwrap());
static NO_SPACE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{4}\d{4}$").unwrap());

pub static HAS_CHOICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:choose|select)\b").unwrap());
pub static CHOICE_EDGE_CASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:an?\s+|one\s+|any\s+)?(?:elective\s+|alternate\s+)?(?:subject|elective)s?\s*$").unwrap()
});
pub static SELECTIONS_GIVEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bfollowing\b").unwrap());
pub static LEVEL_POOL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blevel\s+(\d)\s+pool\b").unwrap());
pub static IS_REPLACED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Z]{4}\s\d{4}).*?(?i:replace).*?([A-Z]{4}\s\d{4})").unwrap()
});

static NUMBER_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(one|two|three|four|five|six)\b").unwrap());
static FIRST_SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^\t\n]*").unwrap());

/// Session classification, checked in order.
static SESSION_TYPES: LazyLock<Vec<(Regex, SessionType)>> = LazyLock::new(|| {
    [
        (r"(?i)\bautumn\b", SessionType::Autumn),
        (r"(?i)\bspring\b", SessionType::Spring),
        (r"(?i)\bsummer\b", SessionType::Summer),
        (r"(?i)\btrimester\b", SessionType::Trimester),
        (r"(?i)\bterm\b", SessionType::Term),
        (r"(?i)\bsemester\b", SessionType::Semester),
    ]
    .into_iter()
    .map(|(re, kind)| (Regex::new(re).unwrap(), kind))
    .collect()
});

/// Specialisation classification, checked in order. "Testamur Major" also
/// contains "Major", so it has to come first.
static SPECIALISATION_TYPES: LazyLock<Vec<(Regex, SpecialisationType)>> = LazyLock::new(|| {
    [
        (r"(?i)\btestamur\s+major\b", SpecialisationType::TestamurMajor),
        (r"(?i)\bmajor\b", SpecialisationType::Major),
        (r"(?i)\bminor\b", SpecialisationType::Minor),
        (r"(?i)\bconcentration\b", SpecialisationType::Concentration),
    ]
    .into_iter()
    .map(|(re, kind)| (Regex::new(re).unwrap(), kind))
    .collect()
});

pub fn session_type(header: &str) -> SessionType {
    SESSION_TYPES
        .iter()
        .find(|(re, _)| re.is_match(header))
        .map(|(_, kind)| *kind)
        .unwrap_or(SessionType::Other)
}

pub fn specialisation_type(title: &str) -> SpecialisationType {
    SPECIALISATION_TYPES
        .iter()
        .find(|(re, _)| re.is_match(title))
        .map(|(_, kind)| *kind)
        .unwrap_or(SpecialisationType::Other)
}

/// "one" → 1 … "six" → 6, using the first number word in `text`.
pub fn number_from_text(text: &str) -> Option<u32> {
    let word = NUMBER_WORD_RE.captures(text)?.get(1)?.as_str().to_lowercase();
    let n = match word.as_str() {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        _ => return None,
    };
    Some(n)
}

/// Collapse whitespace (including NBSP) and insert the missing space in
/// codes written as `COMP1010`. The result still needs validating.
pub fn normalize_code(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if NO_SPACE_CODE_RE.is_match(&collapsed) {
        format!("{} {}", &collapsed[..4], &collapsed[4..])
    } else {
        collapsed
    }
}

pub fn is_canonical_code(code: &str) -> bool {
    CANONICAL_CODE_RE.is_match(code)
}

/// First line of a scraped title, without trailing tab padding.
pub fn clean_title(raw: &str) -> String {
    FIRST_SEGMENT_RE
        .find(raw.trim_start())
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_headers() {
        assert!(YEAR_RE.is_match("Year 1"));
        assert!(YEAR_RE.is_match("Year One"));
        assert!(YEAR_RE.is_match("2nd Year"));
        assert!(!YEAR_RE.is_match("Total Credit Points for Year 1"));
        assert!(!YEAR_RE.is_match("Yearly planning"));
    }

    #[test]
    fn session_headers() {
        for h in ["Autumn session", "Spring Session", "Trimester 1", "Term 3", "1H session", "Summer school"] {
            assert!(SESSION_RE.is_match(h), "{h}");
        }
        assert!(!SESSION_RE.is_match("COMP 1010"));
        assert!(!SESSION_RE.is_match("Long Term Care Nursing"));
    }

    #[test]
    fn session_type_priority() {
        assert_eq!(session_type("Autumn session"), SessionType::Autumn);
        assert_eq!(session_type("Autumn Term"), SessionType::Autumn);
        assert_eq!(session_type("Term 2"), SessionType::Term);
        assert_eq!(session_type("Trimester 1"), SessionType::Trimester);
        assert_eq!(session_type("Semester 1"), SessionType::Semester);
        assert_eq!(session_type("1H session"), SessionType::Other);
    }

    #[test]
    fn specialisation_type_priority() {
        assert_eq!(
            specialisation_type("Computer Science, Testamur Major"),
            SpecialisationType::TestamurMajor
        );
        assert_eq!(specialisation_type("Cyber Security, Major"), SpecialisationType::Major);
        assert_eq!(specialisation_type("Mathematics, Minor"), SpecialisationType::Minor);
        assert_eq!(
            specialisation_type("Networking Concentration"),
            SpecialisationType::Concentration
        );
        assert_eq!(specialisation_type("Key Program"), SpecialisationType::Other);
    }

    #[test]
    fn number_words() {
        assert_eq!(number_from_text("Choose two of the following"), Some(2));
        assert_eq!(number_from_text("Select ONE subject"), Some(1));
        assert_eq!(number_from_text("Year six"), Some(6));
        assert_eq!(number_from_text("Choose seven"), None);
        assert_eq!(number_from_text("Someone"), None);
    }

    #[test]
    fn code_normalisation() {
        assert_eq!(normalize_code("COMP1010"), "COMP 1010");
        assert_eq!(normalize_code("COMP\u{a0}1010"), "COMP 1010");
        assert_eq!(normalize_code(" COMP  1010 "), "COMP 1010");
        assert!(is_canonical_code(&normalize_code("COMP1010")));
        assert!(!is_canonical_code(&normalize_code("comp1010")));
    }

    #[test]
    fn replaced_rows() {
        let caps = IS_REPLACED_RE
            .captures("COMP 1010 has been replaced by COMP 1015")
            .unwrap();
        assert_eq!(&caps[1], "COMP 1010");
        assert_eq!(&caps[2], "COMP 1015");
        assert!(IS_REPLACED_RE.is_match("COMP\u{a0}1010 Replaces COMP\u{a0}1001"));
        assert!(!IS_REPLACED_RE.is_match("COMP 1010 Introduction to Programming"));
    }

    #[test]
    fn choice_markers() {
        assert!(HAS_CHOICE_RE.is_match("Choose one of the following"));
        assert!(HAS_CHOICE_RE.is_match("Select 20 credit points"));
        assert!(!HAS_CHOICE_RE.is_match("Selected Topics in Computing"));
        assert!(CHOICE_EDGE_CASE_RE.is_match("Elective"));
        assert!(CHOICE_EDGE_CASE_RE.is_match("Subject"));
        assert!(CHOICE_EDGE_CASE_RE.is_match("Alternate subject"));
        assert!(!CHOICE_EDGE_CASE_RE.is_match("Subject Guide"));
    }

    #[test]
    fn titles() {
        assert_eq!(clean_title("Bachelor of Arts\t\t\t(1234)"), "Bachelor of Arts");
        assert_eq!(clean_title("\nBachelor of Arts\n"), "Bachelor of Arts");
    }
}
