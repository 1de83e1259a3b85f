pub mod assemble;
pub mod extract;
pub mod location;
pub mod patterns;
pub mod prereq;
pub mod scanner;
pub mod segment;

use thiserror::Error;

pub use assemble::{attach_specialisations, refine_program, refine_specialisation};
pub use prereq::refine_subject;

/// A block of the table could not be read. Fatal for the program or
/// specialisation being refined, never for the run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("no year number in {header:?} (row {row})")]
    YearNumber { header: String, row: usize },

    #[error("year {year} has no sessions (row {row})")]
    NoSessions { year: u32, row: usize },

    #[error("no session header at or after row {row}")]
    MissingSessionHeader { row: usize },

    #[error("{block} starting at row {row} has no subjects")]
    NoSubjects { block: &'static str, row: usize },
}
