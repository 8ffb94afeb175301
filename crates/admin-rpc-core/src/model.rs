//! Data pushed by the server: groups, sections, questions and students.
//!
//! Every type uses the compact positional JSON encoding the server speaks,
//! e.g. a group is `["Math", ["Algebra", 3], ["Geometry", 0]]`.

use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, SeqAccess, Visitor},
    ser::SerializeSeq,
};
use serde_json::Value;

/// A group of students and the sections available for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub sections: Vec<Section>,
}

/// A section label with a count of items (e.g. pending submissions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, i64)", into = "(String, i64)")]
pub struct Section {
    pub name: String,
    pub count: i64,
}

/// Column metadata for the student table. Order defines column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Value, String, String)", into = "(Value, String, String)")]
pub struct Question {
    pub id: Value,
    pub label: String,
    pub tooltip: String,
}

/// One row of the student table.
#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub identity: Identity,
    pub status: StudentStatus,
    /// Positionally aligned with the question sequence of the same push.
    pub answers: Vec<AnswerCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct Identity {
    pub label: String,
    pub tooltip: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(Option<bool>, bool)", into = "(Option<bool>, bool)")]
pub struct StudentStatus {
    pub answered: AnswerStatus,
    pub reviewed: bool,
}

/// Three-valued answered flag. `Unknown` is carried as JSON `null` and is
/// distinct from `NotAnswered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnswerStatus {
    Answered,
    NotAnswered,
    Unknown,
}

impl From<Option<bool>> for AnswerStatus {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Answered,
            Some(false) => Self::NotAnswered,
            None => Self::Unknown,
        }
    }
}

impl From<AnswerStatus> for Option<bool> {
    fn from(value: AnswerStatus) -> Self {
        match value {
            AnswerStatus::Answered => Some(true),
            AnswerStatus::NotAnswered => Some(false),
            AnswerStatus::Unknown => None,
        }
    }
}

/// A student's submissions for one question.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "(bool, Option<Vec<Answer>>)", into = "(bool, Option<Vec<Answer>>)")]
pub struct AnswerCell {
    pub touched: bool,
    /// Full submission history; only the last entry is displayed.
    pub history: Vec<Answer>,
}

impl AnswerCell {
    /// The answer currently displayed, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&Answer> {
        self.history.last()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(AnswerValue, Vec<StyleHint>)", into = "(AnswerValue, Vec<StyleHint>)")]
pub struct Answer {
    pub value: AnswerValue,
    pub style_hints: Vec<StyleHint>,
}

/// Either a bare scalar or a `[number, unit]` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Quantity(f64, String),
    Number(f64),
    Text(String),
    Flag(bool),
}

/// A `(property, value)` style pair applied to a rendered answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct StyleHint {
    pub property: String,
    pub value: String,
}

impl StyleHint {
    #[must_use]
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

impl From<(String, i64)> for Section {
    fn from((name, count): (String, i64)) -> Self {
        Self { name, count }
    }
}

impl From<Section> for (String, i64) {
    fn from(s: Section) -> Self {
        (s.name, s.count)
    }
}

impl From<(Value, String, String)> for Question {
    fn from((id, label, tooltip): (Value, String, String)) -> Self {
        Self { id, label, tooltip }
    }
}

impl From<Question> for (Value, String, String) {
    fn from(q: Question) -> Self {
        (q.id, q.label, q.tooltip)
    }
}

impl From<(String, String)> for Identity {
    fn from((label, tooltip): (String, String)) -> Self {
        Self { label, tooltip }
    }
}

impl From<Identity> for (String, String) {
    fn from(i: Identity) -> Self {
        (i.label, i.tooltip)
    }
}

impl From<(Option<bool>, bool)> for StudentStatus {
    fn from((answered, reviewed): (Option<bool>, bool)) -> Self {
        Self {
            answered: answered.into(),
            reviewed,
        }
    }
}

impl From<StudentStatus> for (Option<bool>, bool) {
    fn from(s: StudentStatus) -> Self {
        (s.answered.into(), s.reviewed)
    }
}

impl From<(bool, Option<Vec<Answer>>)> for AnswerCell {
    fn from((touched, history): (bool, Option<Vec<Answer>>)) -> Self {
        Self {
            touched,
            history: history.unwrap_or_default(),
        }
    }
}

impl From<AnswerCell> for (bool, Option<Vec<Answer>>) {
    fn from(c: AnswerCell) -> Self {
        let history = (!c.history.is_empty()).then_some(c.history);
        (c.touched, history)
    }
}

impl From<(AnswerValue, Vec<StyleHint>)> for Answer {
    fn from((value, style_hints): (AnswerValue, Vec<StyleHint>)) -> Self {
        Self { value, style_hints }
    }
}

impl From<Answer> for (AnswerValue, Vec<StyleHint>) {
    fn from(a: Answer) -> Self {
        (a.value, a.style_hints)
    }
}

impl From<(String, String)> for StyleHint {
    fn from((property, value): (String, String)) -> Self {
        Self { property, value }
    }
}

impl From<StyleHint> for (String, String) {
    fn from(h: StyleHint) -> Self {
        (h.property, h.value)
    }
}

impl Serialize for Group {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.sections.len() + 1))?;
        seq.serialize_element(&self.name)?;
        for section in &self.sections {
            seq.serialize_element(section)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Group {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GroupVisitor;

        impl<'de> Visitor<'de> for GroupVisitor {
            type Value = Group;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a group array [name, [section, count], ...]")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Group, A::Error> {
                let name: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let mut sections = Vec::new();
                while let Some(section) = seq.next_element()? {
                    sections.push(section);
                }
                Ok(Group { name, sections })
            }
        }

        deserializer.deserialize_seq(GroupVisitor)
    }
}

impl Serialize for Student {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.answers.len() + 2))?;
        seq.serialize_element(&self.identity)?;
        seq.serialize_element(&self.status)?;
        for cell in &self.answers {
            seq.serialize_element(cell)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Student {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StudentVisitor;

        impl<'de> Visitor<'de> for StudentVisitor {
            type Value = Student;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a student array [[label, tooltip], [answered, reviewed], cell, ...]")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Student, A::Error> {
                let identity = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let status = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                let mut answers = Vec::new();
                while let Some(cell) = seq.next_element()? {
                    answers.push(cell);
                }
                Ok(Student {
                    identity,
                    status,
                    answers,
                })
            }
        }

        deserializer.deserialize_seq(StudentVisitor)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_group_positional_encoding() {
        let group: Group =
            serde_json::from_value(json!(["Math", ["Algebra", 3], ["Geometry", 0]])).unwrap();
        assert_eq!(group.name, "Math");
        assert_eq!(
            group.sections,
            vec![
                Section {
                    name: "Algebra".into(),
                    count: 3
                },
                Section {
                    name: "Geometry".into(),
                    count: 0
                },
            ]
        );
        assert_eq!(
            serde_json::to_value(&group).unwrap(),
            json!(["Math", ["Algebra", 3], ["Geometry", 0]])
        );
    }

    #[test]
    fn test_group_without_name_is_rejected() {
        assert!(serde_json::from_value::<Group>(json!([])).is_err());
        assert!(serde_json::from_value::<Group>(json!({"name": "Math"})).is_err());
    }

    #[test]
    fn test_student_status_keeps_null_distinct_from_false() {
        let unknown: StudentStatus = serde_json::from_value(json!([null, true])).unwrap();
        let no: StudentStatus = serde_json::from_value(json!([false, true])).unwrap();
        let yes: StudentStatus = serde_json::from_value(json!([true, false])).unwrap();

        assert_eq!(unknown.answered, AnswerStatus::Unknown);
        assert_eq!(no.answered, AnswerStatus::NotAnswered);
        assert_eq!(yes.answered, AnswerStatus::Answered);
        assert_eq!(serde_json::to_value(unknown).unwrap(), json!([null, true]));
    }

    #[test]
    fn test_student_row() {
        let student: Student = serde_json::from_value(json!([
            ["Alice", "alice@example.org"],
            [true, false],
            [true, [[[1.5, "m"], [["color", "red"]]], [2, []]]],
            [false, null],
        ]))
        .unwrap();

        assert_eq!(student.identity.label, "Alice");
        assert!(!student.status.reviewed);
        assert_eq!(student.answers.len(), 2);

        let first = &student.answers[0];
        assert!(first.touched);
        assert_eq!(first.history.len(), 2);
        assert_eq!(first.latest().unwrap().value, AnswerValue::Number(2.0));
        assert_eq!(
            first.history[0].value,
            AnswerValue::Quantity(1.5, "m".into())
        );
        assert_eq!(
            first.history[0].style_hints,
            vec![StyleHint::new("color", "red")]
        );

        assert!(student.answers[1].history.is_empty());
        assert!(student.answers[1].latest().is_none());
    }

    #[test]
    fn test_answer_scalar_kinds() {
        let text: Answer = serde_json::from_value(json!(["x^2", []])).unwrap();
        let flag: Answer = serde_json::from_value(json!([true, []])).unwrap();
        assert_eq!(text.value, AnswerValue::Text("x^2".into()));
        assert_eq!(flag.value, AnswerValue::Flag(true));
    }

    #[test]
    fn test_empty_history_encodes_as_null() {
        let cell = AnswerCell {
            touched: true,
            history: Vec::new(),
        };
        assert_eq!(serde_json::to_value(&cell).unwrap(), json!([true, null]));
    }
}
