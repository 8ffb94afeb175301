//! Drawing the visible view.

use admin_rpc_core::model::StyleHint;
use admin_rpc_session::{
    render::{Background, LatestAnswer, TableCell, TextColor},
    view::{GroupListView, StudentDetailView, StudentTableView, View},
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
};

use crate::app::{App, Field};

pub fn draw(f: &mut Frame, app: &App, view: Option<&View>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // View
            Constraint::Length(1), // Detail of the selection
            Constraint::Length(1), // Status
        ])
        .split(f.area());

    let (hint, keys) = match view {
        None => {
            let waiting = Paragraph::new("Waiting for the server...")
                .block(Block::default().borders(Borders::ALL).title("Admin"));
            f.render_widget(waiting, chunks[0]);
            (String::new(), "q quit")
        }
        Some(View::LoggedOut) => {
            draw_login(f, app, chunks[0]);
            (String::new(), "Tab switch field | Enter submit | Ctrl+C quit")
        }
        Some(View::GroupList(groups)) => {
            draw_groups(f, app, groups, chunks[0]);
            (String::new(), "Up/Down select | Enter open | q quit")
        }
        Some(View::StudentTable(table)) => {
            draw_table(f, app, table, chunks[0]);
            (
                selected_hint(app, table),
                "Up/Down select | Esc back | q quit",
            )
        }
        Some(View::StudentDetail(detail)) => {
            draw_detail(f, detail, chunks[0]);
            (String::new(), "Esc back | q quit")
        }
    };

    f.render_widget(
        Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
        chunks[1],
    );
    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(app.status.as_str(), Style::default().fg(Color::Green)),
        Span::raw(" | "),
        Span::styled(keys, Style::default().fg(Color::Yellow)),
    ]));
    f.render_widget(status, chunks[2]);
}

fn draw_login(f: &mut Frame, app: &App, area: Rect) {
    let focus = |field| {
        if app.field == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        }
    };
    let masked = "*".repeat(app.password.chars().count());
    let form = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("Name:     ", focus(Field::Name)),
            Span::raw(app.name.as_str()),
        ]),
        Line::from(vec![
            Span::styled("Password: ", focus(Field::Password)),
            Span::raw(masked),
        ]),
    ])
    .block(Block::default().borders(Borders::ALL).title("Log in"));
    f.render_widget(form, area);
}

fn draw_groups(f: &mut Frame, app: &App, groups: &GroupListView, area: Rect) {
    let mut lines = Vec::new();
    let mut index = 0;
    for group in &groups.groups {
        lines.push(Line::styled(
            group.name.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        for link in &group.sections {
            let style = if index == app.selected {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default().fg(Color::Cyan)
            };
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(link.label(), style),
            ]));
            index += 1;
        }
    }
    let list = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Groups"));
    f.render_widget(list, area);
}

fn draw_table(f: &mut Frame, app: &App, table: &StudentTableView, area: Rect) {
    let header = Row::new(
        table
            .header
            .iter()
            .map(|cell| Cell::from(cell.label.as_str())),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows = table.rows.iter().map(|row| {
        let identity = Cell::from(row.identity.label.as_str()).style(cell_style(
            text_color(row.identity.color),
            background(row.identity.background),
        ));
        Row::new(std::iter::once(identity).chain(row.cells.iter().map(answer_cell)))
    });

    let widths = std::iter::once(Constraint::Length(20))
        .chain(table.header.iter().skip(1).map(|_| Constraint::Length(14)));
    let widget = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(table.group.as_str()),
        );
    let mut state = TableState::default().with_selected(Some(app.selected));
    f.render_stateful_widget(widget, area, &mut state);
}

fn answer_cell(cell: &TableCell) -> Cell<'_> {
    let base = cell_style(None, background(cell.background));
    let content = cell
        .answer
        .as_ref()
        .map_or_else(Line::default, |answer| answer_line(answer, base));
    Cell::from(content).style(base)
}

/// `count:` as plain text, then the value with the server's style hints.
fn answer_line(answer: &LatestAnswer, base: Style) -> Line<'_> {
    Line::from(vec![
        Span::raw(format!("{}:", answer.count)),
        Span::styled(answer.value.as_str(), base.patch(hint_style(&answer.style))),
    ])
}

fn draw_detail(f: &mut Frame, detail: &StudentDetailView, area: Rect) {
    let labels: Vec<&str> = detail.questions.iter().map(|q| q.label.as_str()).collect();
    let body = serde_json::to_string_pretty(&detail.detail)
        .unwrap_or_else(|_| detail.detail.to_string());
    let mut lines = vec![Line::styled(
        labels.join(" | "),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    lines.extend(body.lines().map(|l| Line::raw(l.to_owned())));
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} / {}", detail.group, detail.student)),
        );
    f.render_widget(widget, area);
}

/// Tooltips of the selected row: the student, then each answer's history.
fn selected_hint(app: &App, table: &StudentTableView) -> String {
    let Some(row) = table.rows.get(app.selected) else {
        return String::new();
    };
    let mut hint = format!(" {}", row.identity.tooltip);
    for cell in &row.cells {
        if let Some(answer) = &cell.answer {
            let history = app.policy.history_tooltip(&answer.history);
            hint.push_str(&format!(" | {}: {history}", cell.tooltip));
        }
    }
    hint
}

pub const fn text_color(color: TextColor) -> Option<Color> {
    match color {
        TextColor::Default => None,
        TextColor::Grey => Some(Color::DarkGray),
        TextColor::Blue => Some(Color::Blue),
    }
}

pub const fn background(background: Background) -> Option<Color> {
    match background {
        Background::None => None,
        Background::Highlight => Some(Color::LightYellow),
        Background::White => Some(Color::White),
        Background::Grey => Some(Color::Gray),
    }
}

/// Text on a coloured background defaults to black.
fn cell_style(fg: Option<Color>, bg: Option<Color>) -> Style {
    let mut style = Style::default();
    if let Some(bg) = bg {
        style = style.bg(bg).fg(Color::Black);
    }
    if let Some(fg) = fg {
        style = style.fg(fg);
    }
    style
}

/// Map server style hints onto terminal attributes. Unknown properties and
/// colours that do not parse are ignored.
pub fn hint_style(hints: &[StyleHint]) -> Style {
    hints.iter().fold(Style::default(), |style, hint| {
        match (hint.property.as_str(), hint.value.as_str()) {
            ("color", value) => value.parse().map_or(style, |c: Color| style.fg(c)),
            ("background" | "background-color", value) => {
                value.parse().map_or(style, |c: Color| style.bg(c))
            }
            ("font-weight", "bold") => style.add_modifier(Modifier::BOLD),
            ("font-style", "italic") => style.add_modifier(Modifier::ITALIC),
            ("text-decoration", "underline") => style.add_modifier(Modifier::UNDERLINED),
            ("text-decoration", "line-through") => style.add_modifier(Modifier::CROSSED_OUT),
            _ => style,
        }
    })
}
