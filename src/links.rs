use std::collections::HashSet;

use serde::Serialize;

use crate::model::{LogicalPrerequisite, MajorMinorData, ProgramData, SubjectData};
use crate::parser::patterns::SUBJECT_CODE_RE;

pub const SUBJECT_DETAILS_URL: &str = "https://hbook.westernsydney.edu.au/subject-details/";

/// Pages linked from program pages, deduplicated in first-seen order.
#[derive(Debug, Default, Serialize)]
pub struct RelatedLinks {
    pub subjects: Vec<String>,
    pub majors: Vec<String>,
    pub minors: Vec<String>,
}

impl RelatedLinks {
    pub fn total(&self) -> usize {
        self.subjects.len() + self.majors.len() + self.minors.len()
    }
}

#[derive(Default)]
struct Ordered {
    seen: HashSet<String>,
    items: Vec<String>,
}

impl Ordered {
    fn extend<'a>(&mut self, links: impl IntoIterator<Item = &'a String>) {
        for link in links {
            if self.seen.insert(link.clone()) {
                self.items.push(link.clone());
            }
        }
    }
}

pub fn related_links(programs: &[ProgramData]) -> RelatedLinks {
    let (mut subjects, mut majors, mut minors) =
        (Ordered::default(), Ordered::default(), Ordered::default());
    for links in programs.iter().filter_map(|p| p.links.as_ref()) {
        subjects.extend(&links.subjects);
        majors.extend(&links.majors);
        minors.extend(&links.minors);
    }
    RelatedLinks {
        subjects: subjects.items,
        majors: majors.items,
        minors: minors.items,
    }
}

/// "COMP 1010" → ".../subject-details/comp1010"
pub fn subject_details_url(code: &str) -> String {
    let slug: String = code
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    format!("{}{}", SUBJECT_DETAILS_URL, slug)
}

/// Detail pages for every subject code listed in major/minor tables.
pub fn specialisation_subject_links(pages: &[MajorMinorData]) -> Vec<String> {
    let mut links = Ordered::default();
    let urls: Vec<String> = pages
        .iter()
        .flat_map(|page| page.sequences.values())
        .flatten()
        .flatten()
        .filter(|cell| SUBJECT_CODE_RE.is_match(cell))
        .map(|cell| subject_details_url(cell))
        .collect();
    links.extend(&urls);
    links.items
}

/// Detail pages for prerequisite codes that are neither in `known` nor
/// among `subjects` themselves. Trailing slashes are ignored when comparing.
pub fn missing_subject_links(subjects: &[SubjectData], known: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = known
        .iter()
        .chain(subjects.iter().filter_map(|s| s.link.as_ref()))
        .map(|link| link.trim_end_matches('/').to_string())
        .collect();
    seen.extend(subjects.iter().filter_map(|s| s.code.as_deref()).map(subject_details_url));

    let mut missing = Vec::new();
    let codes = subjects
        .iter()
        .flat_map(|s| s.logical_prerequisites())
        .flat_map(|p| p.codes())
        .filter(|code| *code != LogicalPrerequisite::SPECIAL);
    for code in codes {
        let url = subject_details_url(code);
        if seen.insert(url.clone()) {
            missing.push(url);
        }
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::read_json;
    use crate::parser::refine_subject;
    use crate::report::RefineLog;
    use std::path::Path;

    fn fixture<T: serde::de::DeserializeOwned>(name: &str) -> T {
        read_json(&Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)).unwrap()
    }

    #[test]
    fn related_links_are_deduplicated() {
        let programs: Vec<ProgramData> = fixture("programs-unrefined.json");
        let links = related_links(&programs);
        assert_eq!(
            links.subjects,
            [
                "https://hbook.westernsydney.edu.au/subject-details/comp1010/",
                "https://hbook.westernsydney.edu.au/subject-details/comp1020/",
            ]
        );
        assert_eq!(links.majors.len(), 1);
        assert_eq!(links.minors.len(), 1);
        assert_eq!(links.total(), 4);
    }

    #[test]
    fn detail_url_from_code() {
        assert_eq!(
            subject_details_url("COMP\u{a0}1010"),
            "https://hbook.westernsydney.edu.au/subject-details/comp1010"
        );
    }

    #[test]
    fn links_from_specialisation_tables() {
        let majors: Vec<MajorMinorData> = fixture("programMajorData.json");
        let links = specialisation_subject_links(&majors);
        assert!(links.contains(&format!("{}comp2020", SUBJECT_DETAILS_URL)));
        assert!(links.contains(&format!("{}comp1010", SUBJECT_DETAILS_URL)));
        let unique: HashSet<_> = links.iter().collect();
        assert_eq!(unique.len(), links.len());
    }

    #[test]
    fn prerequisites_outside_the_known_set() {
        let mut log = RefineLog::new("subjects");
        let subjects: Vec<SubjectData> = fixture::<Vec<SubjectData>>("subjects-unrefined.json")
            .into_iter()
            .map(|s| refine_subject(s, &mut log))
            .collect();
        let known = vec![format!("{}comp1010/", SUBJECT_DETAILS_URL)];

        // COMP 1020 is refined here, so only MATH 1001 is missing.
        assert_eq!(
            missing_subject_links(&subjects, &known),
            [format!("{}math1001", SUBJECT_DETAILS_URL)]
        );
        assert!(missing_subject_links(&subjects[..2], &known).is_empty());
    }
}
