//! The view controller: which single screen is visible and what it shows.
//!
//! The active view is held as one `Option<View>`, so at most one view can be
//! visible and entering a view drops everything the previous one held.
//! Transitions happen only in response to server calls; user actions issue
//! remote calls and wait for the next push.

use admin_rpc_core::{
    ClientProcedure,
    model::{Group, Question, Student},
};
use serde_json::Value;

use crate::render::{HeaderCell, IdentityCell, RenderPolicy, TableCell};

/// The screens of the admin client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewState {
    LoggedOut,
    GroupList,
    StudentTable,
    StudentDetail,
}

impl ViewState {
    /// The state after handling `call` in state `current`.
    ///
    /// `None` means no view is visible (initial state, or after a reset).
    #[must_use]
    pub const fn next(current: Option<Self>, call: &ClientProcedure) -> Option<Self> {
        match call {
            ClientProcedure::ConnectionReplaced => None,
            ClientProcedure::LoginPrompt => Some(Self::LoggedOut),
            ClientProcedure::GroupList { .. } => Some(Self::GroupList),
            ClientProcedure::StudentsList { .. } => Some(Self::StudentTable),
            ClientProcedure::StudentDetail { .. } => Some(Self::StudentDetail),
            ClientProcedure::SetCookie { .. } => current,
        }
    }
}

/// A clickable section, carrying everything needed to request it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionLink {
    pub group: String,
    pub section: String,
    pub count: i64,
}

impl SectionLink {
    /// Label as displayed, e.g. `"Algebra (3)"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} ({})", self.section, self.count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry {
    pub name: String,
    pub sections: Vec<SectionLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupListView {
    pub groups: Vec<GroupEntry>,
}

impl GroupListView {
    /// Find a section link by group and section name.
    #[must_use]
    pub fn link(&self, group: &str, section: &str) -> Option<&SectionLink> {
        self.groups
            .iter()
            .filter(|g| g.name == group)
            .flat_map(|g| &g.sections)
            .find(|s| s.section == section)
    }

    /// All links in display order.
    pub fn links(&self) -> impl Iterator<Item = &SectionLink> {
        self.groups.iter().flat_map(|g| &g.sections)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentRow {
    pub identity: IdentityCell,
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentTableView {
    pub group: String,
    pub header: Vec<HeaderCell>,
    pub rows: Vec<StudentRow>,
}

/// Progress of a single student.
///
/// The server's detail payload is kept as received; how it is laid out is
/// left to the front end.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentDetailView {
    pub group: String,
    pub student: String,
    pub questions: Vec<Question>,
    pub detail: Value,
}

/// The materialized content of the visible view.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    LoggedOut,
    GroupList(GroupListView),
    StudentTable(StudentTableView),
    StudentDetail(StudentDetailView),
}

impl View {
    #[must_use]
    pub const fn state(&self) -> ViewState {
        match self {
            Self::LoggedOut => ViewState::LoggedOut,
            Self::GroupList(_) => ViewState::GroupList,
            Self::StudentTable(_) => ViewState::StudentTable,
            Self::StudentDetail(_) => ViewState::StudentDetail,
        }
    }
}

/// View state machine for one client.
#[derive(Debug, Clone, Default)]
pub struct ViewController {
    active: Option<View>,
    policy: RenderPolicy,
}

impl ViewController {
    /// Create a controller with nothing visible.
    #[must_use]
    pub const fn new(policy: RenderPolicy) -> Self {
        Self {
            active: None,
            policy,
        }
    }

    /// The visible view, if any.
    #[must_use]
    pub const fn active(&self) -> Option<&View> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> Option<ViewState> {
        self.active.as_ref().map(View::state)
    }

    /// The group list, if it is the visible view.
    #[must_use]
    pub const fn group_list(&self) -> Option<&GroupListView> {
        match &self.active {
            Some(View::GroupList(view)) => Some(view),
            _ => None,
        }
    }

    /// The student table, if it is the visible view.
    #[must_use]
    pub const fn student_table(&self) -> Option<&StudentTableView> {
        match &self.active {
            Some(View::StudentTable(view)) => Some(view),
            _ => None,
        }
    }

    /// Handle one server call. The next state is `ViewState::next`; the call
    /// supplies the content of the view being entered.
    pub fn apply(&mut self, call: ClientProcedure) {
        match (ViewState::next(self.state(), &call), call) {
            (None, _) => self.reset(),
            (Some(ViewState::LoggedOut), _) => self.show_login(),
            (Some(ViewState::GroupList), ClientProcedure::GroupList { groups }) => {
                self.show_groups(groups);
            }
            (
                Some(ViewState::StudentTable),
                ClientProcedure::StudentsList {
                    group,
                    questions,
                    students,
                },
            ) => self.show_students(&group, &questions, &students),
            (
                Some(ViewState::StudentDetail),
                ClientProcedure::StudentDetail {
                    group,
                    student,
                    questions,
                    detail,
                },
            ) => self.show_detail(group, student, questions, detail),
            // No new content: the visible view stays as it is.
            (Some(_), _) => {}
        }
    }

    /// Hide every view and drop its content.
    pub fn reset(&mut self) {
        self.active = None;
    }

    fn show_login(&mut self) {
        self.enter(View::LoggedOut);
    }

    fn show_groups(&mut self, groups: Vec<Group>) {
        let groups = groups
            .into_iter()
            .map(|group| GroupEntry {
                sections: group
                    .sections
                    .into_iter()
                    .map(|s| SectionLink {
                        group: group.name.clone(),
                        section: s.name,
                        count: s.count,
                    })
                    .collect(),
                name: group.name,
            })
            .collect();
        self.enter(View::GroupList(GroupListView { groups }));
    }

    fn show_students(&mut self, group: &str, questions: &[Question], students: &[Student]) {
        let rows = students
            .iter()
            .map(|student| StudentRow {
                identity: self.policy.identity(student),
                cells: questions
                    .iter()
                    .zip(&student.answers)
                    .map(|(question, cell)| {
                        self.policy.cell(question, cell, student.status.reviewed)
                    })
                    .collect(),
            })
            .collect();
        self.enter(View::StudentTable(StudentTableView {
            group: group.to_owned(),
            header: self.policy.header(group, questions),
            rows,
        }));
    }

    fn show_detail(
        &mut self,
        group: String,
        student: String,
        questions: Vec<Question>,
        detail: Value,
    ) {
        self.enter(View::StudentDetail(StudentDetailView {
            group,
            student,
            questions,
            detail,
        }));
    }

    fn enter(&mut self, view: View) {
        let from = self.state();
        let to = view.state();
        self.active = Some(view);
        tracing::debug!(?from, ?to, "view transition");
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn groups() -> Vec<Group> {
        serde_json::from_value(json!([
            ["Math", ["Algebra", 3], ["Geometry", 0]],
            ["Physics", ["Optics", 1]]
        ]))
        .unwrap()
    }

    #[test]
    fn test_initially_nothing_visible() {
        let controller = ViewController::default();
        assert!(controller.active().is_none());
        assert_eq!(controller.state(), None);
    }

    #[test]
    fn test_group_list_materializes_links() {
        let mut controller = ViewController::default();
        controller.show_groups(groups());

        let view = controller.group_list().unwrap();
        assert_eq!(view.groups.len(), 2);
        let labels: Vec<_> = view.groups[0].sections.iter().map(SectionLink::label).collect();
        assert_eq!(labels, ["Algebra (3)", "Geometry (0)"]);

        let link = view.link("Physics", "Optics").unwrap();
        assert_eq!(link.group, "Physics");
        assert!(view.link("Math", "Optics").is_none());
        assert_eq!(view.links().count(), 3);
    }

    #[test]
    fn test_entering_a_view_drops_the_previous_one() {
        let mut controller = ViewController::default();
        controller.show_groups(groups());
        controller.show_login();

        assert_eq!(controller.state(), Some(ViewState::LoggedOut));
        assert!(controller.group_list().is_none());

        controller.show_login();
        assert_eq!(controller.active(), Some(&View::LoggedOut));
    }

    #[test]
    fn test_student_table_alignment() {
        let questions: Vec<Question> =
            serde_json::from_value(json!([[1, "Q1", "t1"], [2, "Q2", "t2"]])).unwrap();
        let students: Vec<Student> = serde_json::from_value(json!([
            [["Ann", ""], [true, false], [true, [[4, []]]], [false, null]],
            [["Ben", ""], [null, true], [false, null], [true, [["x", []]]]]
        ]))
        .unwrap();

        let mut controller = ViewController::default();
        controller.show_students("Math", &questions, &students);

        let table = controller.student_table().unwrap();
        assert_eq!(table.header.len(), 3);
        assert_eq!(table.rows.len(), 2);
        assert!(table.rows.iter().all(|r| r.cells.len() == questions.len()));
        assert_eq!(table.rows[0].cells[0].answer.as_ref().unwrap().text(), "1:4");
        assert_eq!(table.rows[1].cells[1].tooltip, "t2");
        assert!(table.rows[1].cells[0].answer.is_none());
    }

    #[test]
    fn test_transition_function() {
        let cookie = ClientProcedure::SetCookie {
            name: "a".into(),
            key: "b".into(),
        };
        assert_eq!(
            ViewState::next(Some(ViewState::GroupList), &cookie),
            Some(ViewState::GroupList)
        );
        assert_eq!(ViewState::next(None, &cookie), None);
        assert_eq!(
            ViewState::next(Some(ViewState::StudentTable), &ClientProcedure::ConnectionReplaced),
            None
        );
        assert_eq!(
            ViewState::next(None, &ClientProcedure::LoginPrompt),
            Some(ViewState::LoggedOut)
        );
    }

    #[test]
    fn test_apply_follows_transition_function() {
        let calls = [
            ClientProcedure::LoginPrompt,
            ClientProcedure::SetCookie {
                name: "a".into(),
                key: "b".into(),
            },
            ClientProcedure::GroupList { groups: groups() },
            ClientProcedure::SetCookie {
                name: "a".into(),
                key: "c".into(),
            },
            ClientProcedure::StudentsList {
                group: "Math".into(),
                questions: Vec::new(),
                students: Vec::new(),
            },
            ClientProcedure::StudentDetail {
                group: "Math".into(),
                student: "Ann".into(),
                questions: Vec::new(),
                detail: json!({"done": 2}),
            },
            ClientProcedure::LoginPrompt,
            ClientProcedure::ConnectionReplaced,
        ];

        let mut controller = ViewController::default();
        for call in calls {
            let expected = ViewState::next(controller.state(), &call);
            controller.apply(call);
            assert_eq!(controller.state(), expected);
        }
        assert!(controller.active().is_none());
    }

    #[test]
    fn test_set_cookie_keeps_content() {
        let mut controller = ViewController::default();
        controller.apply(ClientProcedure::GroupList { groups: groups() });
        let before = controller.active().cloned();

        controller.apply(ClientProcedure::SetCookie {
            name: "a".into(),
            key: "b".into(),
        });
        assert_eq!(controller.active().cloned(), before);
    }

    #[test]
    fn test_reset_hides_everything() {
        let mut controller = ViewController::default();
        controller.show_groups(groups());
        controller.reset();
        assert!(controller.active().is_none());
    }
}
