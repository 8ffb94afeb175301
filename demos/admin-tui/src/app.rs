//! Front-end state that lives outside the session: form input and selection.

use admin_rpc_session::{
    Command, RenderPolicy,
    view::{View, ViewState},
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a key press asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Send(Command),
    Quit,
}

/// Focused login form field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Field {
    #[default]
    Name,
    Password,
}

#[derive(Debug, Default)]
pub struct App {
    pub name: String,
    pub password: String,
    pub field: Field,
    /// Selected section link or student row.
    pub selected: usize,
    pub status: String,
    /// Formats answer histories for display.
    pub policy: RenderPolicy,
    seen: Option<ViewState>,
}

impl App {
    pub fn new(policy: RenderPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Keep the selection valid for the visible view.
    pub fn observe(&mut self, view: Option<&View>) {
        let state = view.map(View::state);
        if state != self.seen {
            self.selected = 0;
            if self.seen == Some(ViewState::LoggedOut) {
                self.password.clear();
            }
            self.seen = state;
        }
        let len = view.map_or(0, selectable);
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn on_key(&mut self, key: KeyEvent, view: Option<&View>) -> Action {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Quit;
        }
        match view {
            Some(View::LoggedOut) => self.on_login_key(key),
            Some(View::GroupList(groups)) => match key.code {
                KeyCode::Enter => groups
                    .links()
                    .nth(self.selected)
                    .map_or(Action::None, |link| {
                        Action::Send(Command::OpenSection(link.clone()))
                    }),
                code => self.on_nav_key(code, groups.links().count()),
            },
            Some(View::StudentTable(table)) => match key.code {
                KeyCode::Esc | KeyCode::Backspace => Action::Send(Command::Back),
                code => self.on_nav_key(code, table.rows.len()),
            },
            Some(View::StudentDetail(_)) => match key.code {
                KeyCode::Esc | KeyCode::Backspace => Action::Send(Command::Back),
                KeyCode::Char('q') => Action::Quit,
                _ => Action::None,
            },
            None => match key.code {
                KeyCode::Char('q') => Action::Quit,
                _ => Action::None,
            },
        }
    }

    fn on_nav_key(&mut self, code: KeyCode, len: usize) -> Action {
        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = (self.selected + 1).min(len.saturating_sub(1));
            }
            KeyCode::Char('q') => return Action::Quit,
            _ => {}
        }
        Action::None
    }

    fn on_login_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char(c) => self.input().push(c),
            KeyCode::Backspace => {
                self.input().pop();
            }
            KeyCode::Tab | KeyCode::Up | KeyCode::Down => self.toggle_field(),
            KeyCode::Enter if self.field == Field::Name => self.field = Field::Password,
            KeyCode::Enter if !self.name.is_empty() => {
                self.status = format!("Logging in as {}...", self.name);
                return Action::Send(Command::Login {
                    name: self.name.clone(),
                    password: std::mem::take(&mut self.password),
                });
            }
            _ => {}
        }
        Action::None
    }

    const fn input(&mut self) -> &mut String {
        match self.field {
            Field::Name => &mut self.name,
            Field::Password => &mut self.password,
        }
    }

    fn toggle_field(&mut self) {
        self.field = match self.field {
            Field::Name => Field::Password,
            Field::Password => Field::Name,
        };
    }
}

fn selectable(view: &View) -> usize {
    match view {
        View::GroupList(groups) => groups.links().count(),
        View::StudentTable(table) => table.rows.len(),
        View::LoggedOut | View::StudentDetail(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use admin_rpc_session::view::{GroupEntry, GroupListView, SectionLink, StudentTableView};

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, view: &View, text: &str) {
        for c in text.chars() {
            assert_eq!(app.on_key(key(KeyCode::Char(c)), Some(view)), Action::None);
        }
    }

    fn groups() -> View {
        let link = |section: &str, count| SectionLink {
            group: "Math".into(),
            section: section.into(),
            count,
        };
        View::GroupList(GroupListView {
            groups: vec![GroupEntry {
                name: "Math".into(),
                sections: vec![link("Algebra", 3), link("Geometry", 0)],
            }],
        })
    }

    #[test]
    fn test_login_form_submits_credentials() {
        let mut app = App::new(RenderPolicy::default());
        let view = View::LoggedOut;
        app.observe(Some(&view));

        type_text(&mut app, &view, "ann");
        app.on_key(key(KeyCode::Enter), Some(&view));
        assert_eq!(app.field, Field::Password);
        type_text(&mut app, &view, "pw!");

        assert_eq!(
            app.on_key(key(KeyCode::Enter), Some(&view)),
            Action::Send(Command::Login {
                name: "ann".into(),
                password: "pw!".into(),
            })
        );
        assert!(app.password.is_empty());
    }

    #[test]
    fn test_q_is_typed_on_the_login_form() {
        let mut app = App::new(RenderPolicy::default());
        let view = View::LoggedOut;
        type_text(&mut app, &view, "quinn");
        assert_eq!(app.name, "quinn");

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(app.on_key(ctrl_c, Some(&view)), Action::Quit);
    }

    #[test]
    fn test_group_list_enter_opens_selected_section() {
        let mut app = App::new(RenderPolicy::default());
        let view = groups();
        app.observe(Some(&view));

        app.on_key(key(KeyCode::Down), Some(&view));
        app.on_key(key(KeyCode::Down), Some(&view));
        assert_eq!(app.selected, 1);

        let Action::Send(Command::OpenSection(link)) = app.on_key(key(KeyCode::Enter), Some(&view))
        else {
            panic!("expected a section request");
        };
        assert_eq!(link.section, "Geometry");
    }

    #[test]
    fn test_back_from_student_table() {
        let mut app = App::new(RenderPolicy::default());
        let view = View::StudentTable(StudentTableView {
            group: "Math".into(),
            header: Vec::new(),
            rows: Vec::new(),
        });
        assert_eq!(
            app.on_key(key(KeyCode::Esc), Some(&view)),
            Action::Send(Command::Back)
        );
        assert_eq!(app.on_key(key(KeyCode::Char('q')), Some(&view)), Action::Quit);
    }

    #[test]
    fn test_selection_resets_on_view_change() {
        let mut app = App::new(RenderPolicy::default());
        let list = groups();
        app.observe(Some(&list));
        app.on_key(key(KeyCode::Down), Some(&list));
        assert_eq!(app.selected, 1);

        app.observe(Some(&View::LoggedOut));
        assert_eq!(app.selected, 0);
    }
}
