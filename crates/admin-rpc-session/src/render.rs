//! Cell rendering rules for the student table.
//!
//! The table is materialized into plain view models; a front end only maps
//! `TextColor`/`Background` to its own palette and applies the style hints.

use admin_rpc_core::model::{
    Answer, AnswerCell, AnswerStatus, AnswerValue, Question, Student, StyleHint,
};

/// Foreground colour of a student's identity cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextColor {
    /// No override.
    Default,
    Grey,
    Blue,
}

/// Background of an identity or answer cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Background {
    /// No override.
    None,
    /// Light highlight marking a row that still needs review.
    Highlight,
    White,
    Grey,
}

impl TextColor {
    /// Colour for a three-valued answered flag.
    #[must_use]
    pub const fn for_status(answered: AnswerStatus) -> Self {
        match answered {
            AnswerStatus::Answered => Self::Default,
            AnswerStatus::NotAnswered => Self::Grey,
            AnswerStatus::Unknown => Self::Blue,
        }
    }
}

/// A column header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    pub label: String,
    pub tooltip: Option<String>,
}

/// The leading cell of a student row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityCell {
    pub label: String,
    pub tooltip: String,
    pub color: TextColor,
    pub background: Background,
}

/// The displayed (latest) answer of a cell.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestAnswer {
    /// Number of submissions so far.
    pub count: usize,
    pub value: String,
    /// Style applied to the value span.
    pub style: Vec<StyleHint>,
    /// Every submission, oldest first, for inspection.
    pub history: Vec<Answer>,
}

impl LatestAnswer {
    /// Text as displayed: `"{count}:"` then the value.
    #[must_use]
    pub fn text(&self) -> String {
        format!("{}:{}", self.count, self.value)
    }
}

/// One rendered answer cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    /// The question's tooltip.
    pub tooltip: String,
    pub answer: Option<LatestAnswer>,
    pub background: Background,
}

/// Rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPolicy {
    /// Replaces `.` in rendered numbers.
    pub decimal_separator: char,
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self {
            decimal_separator: ',',
        }
    }
}

impl RenderPolicy {
    #[must_use]
    pub const fn new(decimal_separator: char) -> Self {
        Self { decimal_separator }
    }

    /// Render an answer value: numbers with the local decimal separator,
    /// quantities as `"<value> <unit>"`.
    #[must_use]
    pub fn format_value(&self, value: &AnswerValue) -> String {
        match value {
            AnswerValue::Quantity(n, unit) => format!("{} {unit}", self.format_number(*n)),
            AnswerValue::Number(n) => self.format_number(*n),
            AnswerValue::Text(s) => s.clone(),
            AnswerValue::Flag(b) => b.to_string(),
        }
    }

    fn format_number(&self, n: f64) -> String {
        let mut buf = [0; 4];
        n.to_string()
            .replace('.', self.decimal_separator.encode_utf8(&mut buf))
    }

    /// Header row: the group name, then one column per question in order.
    #[must_use]
    pub fn header(&self, group: &str, questions: &[Question]) -> Vec<HeaderCell> {
        std::iter::once(HeaderCell {
            label: group.to_owned(),
            tooltip: None,
        })
        .chain(questions.iter().map(|q| HeaderCell {
            label: q.label.clone(),
            tooltip: Some(q.tooltip.clone()),
        }))
        .collect()
    }

    /// The identity cell: colour from the answered flag, highlight until
    /// reviewed.
    #[must_use]
    pub fn identity(&self, student: &Student) -> IdentityCell {
        IdentityCell {
            label: student.identity.label.clone(),
            tooltip: student.identity.tooltip.clone(),
            color: TextColor::for_status(student.status.answered),
            background: if student.status.reviewed {
                Background::None
            } else {
                Background::Highlight
            },
        }
    }

    /// One answer cell.
    #[must_use]
    pub fn cell(&self, question: &Question, cell: &AnswerCell, reviewed: bool) -> TableCell {
        let answer = cell.latest().map(|latest| LatestAnswer {
            count: cell.history.len(),
            value: self.format_value(&latest.value),
            style: latest.style_hints.clone(),
            history: cell.history.clone(),
        });
        let background = match (cell.touched, reviewed) {
            (true, true) => Background::White,
            (true, false) => Background::Grey,
            (false, _) => Background::None,
        };
        TableCell {
            tooltip: question.tooltip.clone(),
            answer,
            background,
        }
    }

    /// Tooltip listing every submission of a cell, oldest first.
    #[must_use]
    pub fn history_tooltip(&self, history: &[Answer]) -> String {
        history
            .iter()
            .map(|answer| self.format_value(&answer.value))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
