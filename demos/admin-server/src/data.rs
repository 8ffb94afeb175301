//! In-memory demo directory of groups, sections and submissions.

use std::collections::BTreeMap;

use admin_rpc_core::model::{
    Answer, AnswerCell, AnswerStatus, AnswerValue, Group, Identity, Question, Section, Student,
    StudentStatus, StyleHint,
};
use serde_json::json;

/// One section: its questions and a row per student.
#[derive(Debug, Clone)]
pub struct SectionData {
    pub questions: Vec<Question>,
    pub students: Vec<Student>,
}

impl SectionData {
    /// Rows that still need review.
    fn pending(&self) -> usize {
        self.students.iter().filter(|s| !s.status.reviewed).count()
    }
}

/// Groups and their sections, in display order.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    groups: BTreeMap<String, BTreeMap<String, SectionData>>,
}

impl Directory {
    /// The group list pushed to clients; each count is the number of
    /// students awaiting review.
    #[must_use]
    pub fn groups(&self) -> Vec<Group> {
        self.groups
            .iter()
            .map(|(name, sections)| Group {
                name: name.clone(),
                sections: sections
                    .iter()
                    .map(|(section, data)| Section {
                        name: section.clone(),
                        count: i64::try_from(data.pending()).unwrap_or(i64::MAX),
                    })
                    .collect(),
            })
            .collect()
    }

    #[must_use]
    pub fn section(&self, group: &str, section: &str) -> Option<&SectionData> {
        self.groups.get(group)?.get(section)
    }

    pub fn insert(&mut self, group: &str, section: &str, data: SectionData) {
        self.groups
            .entry(group.to_owned())
            .or_default()
            .insert(section.to_owned(), data);
    }

    /// A small classroom to click around in.
    #[must_use]
    pub fn demo() -> Self {
        let mut directory = Self::default();
        directory.insert("Math", "Algebra", algebra());
        directory.insert(
            "Math",
            "Geometry",
            SectionData {
                questions: vec![question(1, "Area", "Area of the triangle")],
                students: vec![student("Ann", None, true, vec![AnswerCell::default()])],
            },
        );
        directory.insert("Physics", "Optics", optics());
        directory
    }
}

fn question(id: i64, label: &str, tooltip: &str) -> Question {
    Question {
        id: json!(id),
        label: label.to_owned(),
        tooltip: tooltip.to_owned(),
    }
}

fn student(
    name: &str,
    answered: Option<bool>,
    reviewed: bool,
    answers: Vec<AnswerCell>,
) -> Student {
    Student {
        identity: Identity {
            label: name.to_owned(),
            tooltip: format!("{}@school.example", name.to_lowercase()),
        },
        status: StudentStatus {
            answered: AnswerStatus::from(answered),
            reviewed,
        },
        answers,
    }
}

fn answered(touched: bool, values: Vec<AnswerValue>, last_style: Vec<StyleHint>) -> AnswerCell {
    let last = values.len().saturating_sub(1);
    AnswerCell {
        touched,
        history: values
            .into_iter()
            .enumerate()
            .map(|(i, value)| Answer {
                value,
                style_hints: if i == last { last_style.clone() } else { Vec::new() },
            })
            .collect(),
    }
}

fn algebra() -> SectionData {
    let correct = vec![StyleHint::new("color", "green")];
    let wrong = vec![StyleHint::new("color", "red")];
    SectionData {
        questions: vec![
            question(1, "x", "Solve 2x = 5"),
            question(2, "y", "Solve y^2 = 9, y > 0"),
        ],
        students: vec![
            student(
                "Ann",
                Some(true),
                false,
                vec![
                    answered(
                        true,
                        vec![AnswerValue::Number(2.0), AnswerValue::Number(2.5)],
                        correct.clone(),
                    ),
                    answered(false, vec![AnswerValue::Number(3.0)], correct),
                ],
            ),
            student(
                "Ben",
                Some(false),
                true,
                vec![
                    answered(
                        true,
                        vec![AnswerValue::Text("five halves".into())],
                        wrong.clone(),
                    ),
                    AnswerCell::default(),
                ],
            ),
            student(
                "Jörgen Å",
                None,
                false,
                vec![
                    AnswerCell::default(),
                    answered(false, vec![AnswerValue::Number(-3.0)], wrong),
                ],
            ),
        ],
    }
}

fn optics() -> SectionData {
    SectionData {
        questions: vec![question(7, "f", "Focal length of the lens")],
        students: vec![student(
            "Cleo",
            Some(true),
            false,
            vec![answered(
                true,
                vec![AnswerValue::Quantity(0.25, "m".into())],
                vec![StyleHint::new("font-weight", "bold")],
            )],
        )],
    }
}
