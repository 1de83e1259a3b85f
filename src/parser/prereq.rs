//! Free-text prerequisites to AND-of-OR groups.
//!
//! The text is split into words and reduced to a token stream of codes,
//! operators, line breaks and course qualifiers; everything else (subject
//! titles, prose) is dropped. The token stream is then folded into
//! [`LogicalPrerequisite`] entries.

use std::sync::LazyLock;

use regex::Regex;

use super::patterns::{is_canonical_code, normalize_code};
use crate::model::{LogicalPrerequisite, OrGroup, Prerequisites, SubjectData};
use crate::report::{RefineLog, WarningKind};

static GLUED_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{4}\d{3,5}$").unwrap());
static CODE_LETTERS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{4}$").unwrap());
static CODE_DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{3,5}$").unwrap());
static COURSE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}$").unwrap());
static TITLE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{4})\s?(\d{4})\b").unwrap());

const PLACEHOLDERS: [&str; 5] = ["none", "nil", "n/a", "na", "not applicable"];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Code(String),
    And,
    Or,
    Replace,
    Break,
    Course(String),
}

/// Normalize prerequisite text into logical form. Pure apart from the
/// warnings it records.
pub fn normalize(text: &str, log: &mut RefineLog) -> Vec<LogicalPrerequisite> {
    if is_placeholder(text) {
        return Vec::new();
    }

    let tokens = tokenize(text, log);
    if !tokens.iter().any(|t| matches!(t, Token::Code(_))) {
        return vec![LogicalPrerequisite {
            course: LogicalPrerequisite::SPECIAL.to_string(),
            and: Vec::new(),
        }];
    }

    let mut builder = Builder::default();
    for token in tokens {
        builder.push(token);
    }
    builder.finish()
}

fn is_placeholder(text: &str) -> bool {
    let trimmed = text.trim().trim_end_matches('.');
    trimmed.chars().count() < 7 && !GLUED_CODE_RE.is_match(trimmed)
        || PLACEHOLDERS.contains(&trimmed.to_lowercase().as_str())
}

fn tokenize(text: &str, log: &mut RefineLog) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut after_code = false;

    for (n, line) in text.lines().enumerate() {
        if n > 0 {
            tokens.push(Token::Break);
        }
        let words: Vec<&str> = line
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| !w.is_empty())
            .collect();
        let alone = words.len() == 1;

        let mut i = 0;
        while i < words.len() {
            let word = words[i];
            let upper = word.chars().all(|c| c.is_ascii_uppercase());
            let counts = after_code || upper || alone || code_at(&words, i + 1).is_some();

            if let Some((raw, used)) = code_at(&words, i) {
                let code = normalize_code(&raw);
                if is_canonical_code(&code) {
                    tokens.push(Token::Code(code));
                    after_code = true;
                } else {
                    log.warn(WarningKind::InvalidSubjectCode, format!("skipped {:?}", raw));
                    after_code = false;
                }
                i += used;
                continue;
            }

            let lower = word.to_lowercase();
            match lower.as_str() {
                "and" if counts => tokens.push(Token::And),
                "or" if counts => tokens.push(Token::Or),
                w if w.starts_with("replace") && after_code => tokens.push(Token::Replace),
                "for" => {
                    if let Some((course, at)) = course_after(&words, i + 1) {
                        tokens.push(Token::Course(course.to_string()));
                        i = at;
                    }
                }
                _ => {}
            }
            // "replaced by X": the code after "by" still pairs with the one before.
            after_code = after_code && (lower.starts_with("replace") || lower == "by");
            i += 1;
        }
    }

    tokens
}

/// A subject code starting at word `i`: either `COMP1010` or `COMP 1010`.
fn code_at(words: &[&str], i: usize) -> Option<(String, usize)> {
    let word = *words.get(i)?;
    if GLUED_CODE_RE.is_match(word) {
        return Some((word.to_string(), 1));
    }
    let next = words.get(i + 1)?;
    (CODE_LETTERS_RE.is_match(word) && CODE_DIGITS_RE.is_match(next))
        .then(|| (format!("{} {}", word, next), 2))
}

/// "for Bachelor of Data Science 3769": the course code and its word index.
/// Course names may contain "and"; only a subject code or the end of the
/// line stops the search.
fn course_after<'w>(words: &[&'w str], from: usize) -> Option<(&'w str, usize)> {
    (from..words.len())
        .take_while(|&j| code_at(words, j).is_none())
        .find(|&j| COURSE_CODE_RE.is_match(words[j]))
        .map(|j| (words[j], j))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Pending {
    Nothing,
    And,
    Or,
    /// An OR followed by a line break.
    OrBreak,
}

struct Builder {
    entries: Vec<LogicalPrerequisite>,
    course: String,
    groups: Vec<OrGroup>,
    group: Vec<String>,
    pending: Pending,
}

impl Default for Builder {
    fn default() -> Self {
        Builder {
            entries: Vec::new(),
            course: LogicalPrerequisite::ANY_COURSE.to_string(),
            groups: Vec::new(),
            group: Vec::new(),
            pending: Pending::Nothing,
        }
    }
}

impl Builder {
    fn push(&mut self, token: Token) {
        match token {
            Token::Code(code) => {
                match self.pending {
                    Pending::Or => {}
                    Pending::OrBreak => {
                        self.close_group();
                        self.close_entry();
                    }
                    Pending::And | Pending::Nothing => self.close_group(),
                }
                if !self.group.contains(&code) {
                    self.group.push(code);
                }
                self.pending = Pending::Nothing;
            }
            Token::And if !self.group.is_empty() => self.pending = Pending::And,
            Token::Or | Token::Replace if !self.group.is_empty() => self.pending = Pending::Or,
            Token::Break if self.pending == Pending::Or => self.pending = Pending::OrBreak,
            Token::Course(course) => {
                self.close_group();
                self.close_entry();
                self.course = course;
                self.pending = Pending::Nothing;
            }
            _ => {}
        }
    }

    fn close_group(&mut self) {
        if !self.group.is_empty() {
            self.groups.push(OrGroup {
                or: std::mem::take(&mut self.group),
            });
        }
    }

    fn close_entry(&mut self) {
        if !self.groups.is_empty() {
            self.entries.push(LogicalPrerequisite {
                course: self.course.clone(),
                and: std::mem::take(&mut self.groups),
            });
        }
    }

    fn finish(mut self) -> Vec<LogicalPrerequisite> {
        self.close_group();
        self.close_entry();
        self.entries
    }
}

/// Subject code from a page title such as "COMP 1010 Introduction to Programming".
pub fn code_from_title(title: &str) -> Option<String> {
    let caps = TITLE_CODE_RE.captures(title)?;
    Some(format!("{} {}", &caps[1], &caps[2]))
}

/// Fill in the subject code and replace raw prerequisite text with its
/// logical form, keeping the text as `originalPrerequisites`.
pub fn refine_subject(mut subject: SubjectData, log: &mut RefineLog) -> SubjectData {
    if subject.code.is_none() {
        subject.code = subject.subject.as_deref().and_then(code_from_title);
    }
    match subject.prerequisites.take() {
        Some(Prerequisites::Raw(text)) => {
            subject.prerequisites = Some(Prerequisites::Logical(normalize(&text, log)));
            subject.original_prerequisites.get_or_insert(text);
        }
        other => subject.prerequisites = other,
    }
    subject
}
