use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

/// Non-fatal conditions noticed while refining one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WarningKind {
    MissingCreditPoints,
    ChoiceQuantity,
    MissingLocationField,
    UnrelatedReplacement,
    DroppedEntry,
    InvalidSubjectCode,
    EmptySequence,
    UnknownSubject,
}

#[derive(Debug, Clone, Serialize)]
pub struct Warning {
    pub context: String,
    pub kind: WarningKind,
    pub detail: String,
}

/// Side log threaded through the parser in place of a global "current item".
#[derive(Debug, Default)]
pub struct RefineLog {
    context: String,
    loud: bool,
    warnings: Vec<Warning>,
}

impl RefineLog {
    pub fn new(context: impl Into<String>) -> Self {
        RefineLog {
            context: context.into(),
            loud: false,
            warnings: Vec::new(),
        }
    }

    /// Also emit each warning at `warn` level as it is recorded.
    pub fn loud(mut self, loud: bool) -> Self {
        self.loud = loud;
        self
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn warn(&mut self, kind: WarningKind, detail: impl Into<String>) {
        let detail = detail.into();
        if self.loud {
            warn!(context = %self.context, ?kind, "{}", detail);
        } else {
            debug!(context = %self.context, ?kind, "{}", detail);
        }
        self.warnings.push(Warning {
            context: self.context.clone(),
            kind,
            detail,
        });
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct Tally {
    pub parsed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub item: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub programs: Tally,
    pub majors: Tally,
    pub minors: Tally,
    pub subjects: Tally,
    pub failures: Vec<Failure>,
    pub warnings: Vec<Warning>,
}

impl RefineReport {
    pub fn new() -> Self {
        let started_at = Utc::now();
        RefineReport {
            run_id: format!("run-{}", started_at.timestamp()),
            started_at,
            finished_at: None,
            programs: Tally::default(),
            majors: Tally::default(),
            minors: Tally::default(),
            subjects: Tally::default(),
            failures: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn fail(&mut self, item: impl Into<String>, error: impl ToString) {
        let item = item.into();
        let error = error.to_string();
        warn!("Skipping {}: {}", item, error);
        self.failures.push(Failure { item, error });
    }

    pub fn absorb(&mut self, log: RefineLog) {
        self.warnings.extend(log.into_warnings());
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn print(&self) {
        println!(
            "Programs: {} parsed, {} skipped",
            self.programs.parsed, self.programs.skipped
        );
        println!(
            "Majors:   {} parsed, {} skipped",
            self.majors.parsed, self.majors.skipped
        );
        println!(
            "Minors:   {} parsed, {} skipped",
            self.minors.parsed, self.minors.skipped
        );
        if self.subjects.parsed + self.subjects.skipped > 0 {
            println!(
                "Subjects: {} refined, {} without a code",
                self.subjects.parsed, self.subjects.skipped
            );
        }
        println!("Warnings: {}", self.warnings.len());
    }
}
