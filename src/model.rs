use std::collections::BTreeMap;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// One table row as flattened by the scraper: the text of every cell, in order.
pub type Row = Vec<String>;

// ── Scraped input ──

/// A program page as scraped from the handbook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramData {
    pub name: String,
    #[serde(default)]
    pub locations: Vec<BTreeMap<String, String>>,
    /// Named row tables; `"structure"` is the canonical recommended sequence.
    #[serde(default)]
    pub sequence: BTreeMap<String, Vec<Row>>,
    #[serde(default)]
    pub links: Option<ProgramLinkData>,
    #[serde(default)]
    pub original_link: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramLinkData {
    #[serde(default)]
    pub majors: Vec<String>,
    #[serde(default)]
    pub minors: Vec<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
}

/// A major/minor page as scraped from the handbook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MajorMinorData {
    /// The scraper writes the type as its enum index (0..=4); older files
    /// carry the name. Anything else is left to the title.
    #[serde(default, rename = "type", deserialize_with = "scraped_specialisation_type")]
    pub kind: Option<SpecialisationType>,
    pub name: String,
    #[serde(default)]
    pub locations: Vec<BTreeMap<String, String>>,
    #[serde(default)]
    pub sequences: BTreeMap<String, Vec<Row>>,
    #[serde(default)]
    pub original_link: String,
}

// ── Refined curriculum ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSummary {
    pub code: String,
    pub name: String,
    /// `None` when the table gave no usable number.
    pub credit_points: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_level: Option<u32>,
}

impl SubjectSummary {
    /// Placeholder code for non-subject options inside an enumerated choice.
    pub const SPECIAL: &'static str = "SPECIAL";

    /// Missing or negative credit points mark a failed extraction.
    pub fn has_valid_credit_points(&self) -> bool {
        matches!(self.credit_points, Some(cp) if cp >= 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Choices {
    Subjects(Vec<SubjectSummary>),
    /// Open-ended instructions, kept verbatim.
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectChoice {
    pub choices: Choices,
    pub number_to_choose: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SubjectEntry {
    Subject(SubjectSummary),
    Choice(SubjectChoice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionType {
    Autumn,
    Spring,
    Summer,
    Trimester,
    Term,
    Semester,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_type: SessionType,
    pub subjects: Vec<SubjectEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Year {
    pub year: u32,
    pub sessions: Vec<Session>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    pub name: String,
    pub sequence: Vec<Year>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpecialisationType {
    TestamurMajor,
    Major,
    Minor,
    Concentration,
    Other,
}

impl SpecialisationType {
    /// Variants in the scraper's declaration order.
    const BY_INDEX: [SpecialisationType; 5] = [
        SpecialisationType::TestamurMajor,
        SpecialisationType::Major,
        SpecialisationType::Minor,
        SpecialisationType::Concentration,
        SpecialisationType::Other,
    ];

    pub fn from_index(index: u64) -> Option<Self> {
        Self::BY_INDEX.get(usize::try_from(index).ok()?).copied()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::BY_INDEX.into_iter().find(|kind| kind.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialisationType::TestamurMajor => "testamurMajor",
            SpecialisationType::Major => "major",
            SpecialisationType::Minor => "minor",
            SpecialisationType::Concentration => "concentration",
            SpecialisationType::Other => "other",
        }
    }
}

fn scraped_specialisation_type<'de, D>(deserializer: D) -> Result<Option<SpecialisationType>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scraped {
        Index(u64),
        Name(String),
        Unknown(IgnoredAny),
    }

    Ok(match Option::<Scraped>::deserialize(deserializer)? {
        Some(Scraped::Index(index)) => SpecialisationType::from_index(index),
        Some(Scraped::Name(name)) => SpecialisationType::from_name(&name),
        Some(Scraped::Unknown(_)) | None => None,
    })
}

/// A major or minor; both share one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specialisation {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SpecialisationType,
    pub subjects: Vec<SubjectEntry>,
    pub link: String,
    #[serde(default)]
    pub locations: Vec<LocationInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub campus: String,
    pub attendance: String,
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSummary {
    pub name: String,
    pub link: String,
    pub sequences: Vec<Sequence>,
    pub locations: Vec<LocationInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub majors: Option<Vec<Specialisation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minors: Option<Vec<Specialisation>>,
}

// ── Prerequisites ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrGroup {
    #[serde(rename = "OR")]
    pub or: Vec<String>,
}

/// Every AND element must be satisfied by completing at least one of its OR codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalPrerequisite {
    pub course: String,
    #[serde(rename = "AND")]
    pub and: Vec<OrGroup>,
}

impl LogicalPrerequisite {
    pub const ANY_COURSE: &'static str = "any";
    pub const SPECIAL: &'static str = "SPECIAL";

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.and.iter().flat_map(|g| g.or.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prerequisites {
    Logical(Vec<LogicalPrerequisite>),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentData {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub length: Option<String>,
    #[serde(default)]
    pub percent: Option<f64>,
    #[serde(default)]
    pub threshold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mandatory: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeachingPeriodData {
    pub period: String,
    #[serde(default)]
    pub locations: Vec<String>,
}

/// A subject page, before or after prerequisite refinement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectData {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub credit_points: Option<f64>,
    #[serde(default)]
    pub coordinator: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub discipline: Option<String>,
    #[serde(default)]
    pub teaching_periods: Vec<TeachingPeriodData>,
    #[serde(default)]
    pub prerequisites: Option<Prerequisites>,
    #[serde(default)]
    pub original_prerequisites: Option<String>,
    #[serde(default)]
    pub assessments: Vec<AssessmentData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl SubjectData {
    pub fn logical_prerequisites(&self) -> &[LogicalPrerequisite] {
        match &self.prerequisites {
            Some(Prerequisites::Logical(p)) => p,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(code: &str, cp: i32) -> SubjectSummary {
        SubjectSummary {
            code: code.to_string(),
            name: format!("Subject {}", code),
            credit_points: Some(cp),
            subject_level: None,
        }
    }

    fn sample_program() -> ProgramSummary {
        ProgramSummary {
            name: "Bachelor of Computer Science".into(),
            link: "https://hbook.westernsydney.edu.au/programs/bachelor-computer-science/".into(),
            sequences: vec![Sequence {
                name: "Sequence 1".into(),
                sequence: vec![Year {
                    year: 1,
                    sessions: vec![Session {
                        session_type: SessionType::Autumn,
                        subjects: vec![
                            SubjectEntry::Subject(summary("COMP 1010", 10)),
                            SubjectEntry::Choice(SubjectChoice {
                                choices: Choices::Subjects(vec![
                                    summary("MATH 1001", 10),
                                    SubjectSummary {
                                        subject_level: Some(2),
                                        ..summary("MATH 2002", 10)
                                    },
                                ]),
                                number_to_choose: 1,
                            }),
                            SubjectEntry::Choice(SubjectChoice {
                                choices: Choices::Text("Select any Level 2 subject".into()),
                                number_to_choose: 1,
                            }),
                        ],
                    }],
                }],
            }],
            locations: vec![LocationInfo {
                campus: "Parramatta City".into(),
                attendance: "Full Time".into(),
                mode: "Internal".into(),
            }],
            majors: Some(vec![Specialisation {
                name: "Cyber Security, Major".into(),
                kind: SpecialisationType::Major,
                subjects: vec![SubjectEntry::Subject(SubjectSummary {
                    credit_points: None,
                    ..summary("COMP 2020", 0)
                })],
                link: "https://hbook.westernsydney.edu.au/majors-minors/cyber-security-major/".into(),
                locations: vec![],
            }]),
            minors: None,
        }
    }

    #[test]
    fn program_summary_round_trip() {
        let program = sample_program();
        let json = serde_json::to_string_pretty(&program).unwrap();
        let back: ProgramSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(program, back);
    }

    #[test]
    fn entries_carry_discriminant() {
        let json = serde_json::to_value(sample_program()).unwrap();
        let subjects = &json["sequences"][0]["sequence"][0]["sessions"][0]["subjects"];
        assert_eq!(subjects[0]["kind"], "subject");
        assert_eq!(subjects[0]["creditPoints"], 10);
        assert_eq!(subjects[1]["kind"], "choice");
        assert_eq!(subjects[1]["numberToChoose"], 1);
        assert_eq!(json["sequences"][0]["sequence"][0]["sessions"][0]["sessionType"], "AUTUMN");
        assert_eq!(json["majors"][0]["type"], "major");
    }

    #[test]
    fn logical_prerequisite_shape() {
        let p = LogicalPrerequisite {
            course: "any".into(),
            and: vec![OrGroup { or: vec!["COMP 1010".into()] }],
        };
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"{"course":"any","AND":[{"OR":["COMP 1010"]}]}"#);
    }

    #[test]
    fn subject_data_accepts_raw_and_logical_prerequisites() {
        let raw: SubjectData =
            serde_json::from_str(r#"{"subject":"COMP 2020 Data Structures","prerequisites":"COMP 1010"}"#)
                .unwrap();
        assert!(matches!(raw.prerequisites, Some(Prerequisites::Raw(ref s)) if s == "COMP 1010"));

        let refined: SubjectData = serde_json::from_str(
            r#"{"subject":"COMP 2020","prerequisites":[{"course":"any","AND":[{"OR":["COMP 1010"]}]}]}"#,
        )
        .unwrap();
        assert_eq!(refined.logical_prerequisites().len(), 1);
    }

    #[test]
    fn program_data_reads_scraper_shape() {
        let json = r#"{
            "name": "Bachelor of Data Science\t\t",
            "locations": [{"column0": "Campus", "column1": "Attendance", "column2": "Mode"}],
            "sequence": {"structure": [["Year 1"], ["Autumn session"], ["COMP 1010", "Intro", "10"]]},
            "links": {"majors": [], "minors": [], "subjects": []},
            "originalLink": "https://hbook.westernsydney.edu.au/programs/data-science/"
        }"#;
        let data: ProgramData = serde_json::from_str(json).unwrap();
        assert_eq!(data.sequence["structure"].len(), 3);
        assert!(data.links.is_some());
    }

    #[test]
    fn specialisation_type_from_scraper_index_or_name() {
        let pages: Vec<MajorMinorData> = serde_json::from_str(
            r#"[
                {"type": 1, "name": "Cyber Security, Major"},
                {"type": 0, "name": "Computer Science, Testamur Major"},
                {"type": "minor", "name": "Mathematics, Minor"},
                {"type": 9, "name": "Odd, Major"},
                {"type": {"weird": true}, "name": "Odder, Major"},
                {"type": null, "name": "Plain, Major"},
                {"name": "Untyped, Major"}
            ]"#,
        )
        .unwrap();
        let kinds: Vec<_> = pages.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            [
                Some(SpecialisationType::Major),
                Some(SpecialisationType::TestamurMajor),
                Some(SpecialisationType::Minor),
                None,
                None,
                None,
                None,
            ]
        );
    }

    #[test]
    fn credit_point_validity() {
        assert!(summary("COMP 1010", 0).has_valid_credit_points());
        assert!(!summary("COMP 1010", -10).has_valid_credit_points());
        let missing = SubjectSummary { credit_points: None, ..summary("COMP 1010", 0) };
        assert!(!missing.has_valid_credit_points());
    }
}
