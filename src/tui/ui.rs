//! UI layout and rendering logic for the TUI.

use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
    Frame,
};

use super::app::{App, PopupState};
use crate::session::{files::is_valid_file_name, Panel, Tab};
use crate::utils::unicode::prefix_width;

/// Render the main UI
pub fn render_ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Tabs
            Constraint::Min(3),    // Editor and result
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_tabs(frame, app, main_layout[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(main_layout[1]);
    render_editor(frame, app, body[0]);
    render_result(frame, app, body[1]);

    render_status_bar(frame, app, main_layout[2]);

    if app.show_help {
        render_help_overlay(frame);
    }

    match &app.popup_state {
        PopupState::ConfirmRemove { name, .. } => render_confirm_popup(frame, app, name),
        PopupState::Rename { input, .. } => render_rename_popup(frame, input),
        PopupState::Share => render_share_popup(frame, app),
        PopupState::None => {}
    }
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let tabs = app.tabs();
    let titles: Vec<Line> = tabs
        .iter()
        .map(|tab| {
            let title = app.tab_title(*tab);
            let style = match tab {
                Tab::Code => Style::default().fg(Color::White),
                Tab::File(_) if is_valid_file_name(&title) => Style::default().fg(Color::Green),
                Tab::File(_) => Style::default().fg(Color::Red),
            };
            Line::from(Span::styled(title, style))
        })
        .collect();
    let selected = tabs.iter().position(|t| *t == app.session.focus()).unwrap_or(0);

    let widget = Tabs::new(titles)
        .select(selected)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD))
        .divider("|");
    frame.render_widget(widget, area);
}

fn render_editor(frame: &mut Frame, app: &App, area: Rect) {
    let (row, col) = app.editor.cursor();
    let inner_height = area.height.saturating_sub(2) as usize;
    let scroll = row.saturating_sub(inner_height.saturating_sub(1));

    let lines: Vec<Line> = app.editor.lines().iter().map(|l| Line::from(l.as_str())).collect();
    let title = format!("{} | {}", app.tab_title(app.session.focus()), app.session.location());
    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((scroll as u16, 0));
    frame.render_widget(paragraph, area);

    if !app.show_help && !app.is_popup_shown() {
        let x = prefix_width(&app.editor.lines()[row], col) as u16;
        let y = (row - scroll) as u16;
        let max_x = area.width.saturating_sub(2);
        frame.set_cursor_position(Position::new(area.x + 1 + x.min(max_x), area.y + 1 + y));
    }
}

fn render_result(frame: &mut Frame, app: &App, area: Rect) {
    let session = &app.session;
    let mut lines = Vec::new();

    let (title, border) = match session.panel() {
        Panel::Output => {
            for line in session.error().unwrap_or_default().lines() {
                lines.push(Line::from(Span::styled(line.to_string(), Style::default().fg(Color::Red))));
            }
            ("Output", Color::Red)
        }
        Panel::Plot => {
            if session.result().is_none() {
                lines.push(Line::from("Press Ctrl+R to run, Ctrl+S to save."));
            }
            if !session.svg().is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("SVG image, {} bytes (Ctrl+E to export)", session.svg().len()),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                )));
                if !session.id().is_empty() {
                    lines.push(Line::from(session.image_url()));
                }
                lines.push(Line::from(""));
            }
            for line in session.output().lines() {
                lines.push(Line::from(line.to_string()));
            }
            ("Plot", Color::Cyan)
        }
    };

    let title = if session.is_loading() { format!("{} (running...)", title) } else { title.to_string() };
    let paragraph = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title(title),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.result_scroll, 0));
    frame.render_widget(paragraph, area);
}

/// Render the status bar
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status_paragraph = Paragraph::new(app.status_message.as_str())
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(status_paragraph, area);
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame) {
    let popup_area = centered_rect(70, 70, frame.area());
    frame.render_widget(Clear, popup_area);

    let help_lines = vec![
        Line::from("Editor Help"),
        Line::from(""),
        Line::from("Plot:"),
        Line::from("  Ctrl+R          - Run the code on the server"),
        Line::from("  Ctrl+S          - Save as a new plot"),
        Line::from("  Ctrl+U          - Show share links"),
        Line::from("  Ctrl+E          - Export the SVG image"),
        Line::from("  PgUp/PgDn       - Scroll the result panel"),
        Line::from(""),
        Line::from("Files:"),
        Line::from("  Ctrl+N          - Add a file"),
        Line::from("  Ctrl+D          - Remove the current file"),
        Line::from("  F2              - Rename the current file"),
        Line::from("  Ctrl+Left/Right - Switch tab"),
        Line::from(""),
        Line::from("  F1              - Toggle this help"),
        Line::from("  Ctrl+C Ctrl+C   - Quit"),
    ];

    let help_paragraph = Paragraph::new(Text::from(help_lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help")
                .title_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(help_paragraph, popup_area);
}

/// Helper function to create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn render_confirm_popup(frame: &mut Frame, app: &App, name: &str) {
    let popup_area = centered_rect(50, 25, frame.area());
    frame.render_widget(Clear, popup_area);

    let text = Text::from(vec![
        Line::from(format!("{} ({})", app.remove_prompt(), name)),
        Line::from(""),
        Line::from(Span::styled("y = remove, any other key = keep", Style::default().fg(Color::Yellow))),
    ]);
    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Remove file")
                .title_style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, popup_area);
}

fn render_rename_popup(frame: &mut Frame, input: &str) {
    let popup_area = centered_rect(50, 25, frame.area());
    frame.render_widget(Clear, popup_area);

    let (hint, color) = if is_valid_file_name(input) {
        ("Enter = rename, Esc = cancel", Color::Green)
    } else {
        ("Only [0-9a-zA-Z_] is accepted by the server", Color::Red)
    };
    let text = Text::from(vec![
        Line::from(Span::styled(input.to_string(), Style::default().fg(color))),
        Line::from(""),
        Line::from(Span::styled(hint, Style::default().fg(Color::Yellow))),
    ]);
    let paragraph = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("File name"));
    frame.render_widget(paragraph, popup_area);
}

fn render_share_popup(frame: &mut Frame, app: &App) {
    let popup_area = centered_rect(85, 60, frame.area());
    frame.render_widget(Clear, popup_area);

    let session = &app.session;
    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let lines = if session.id().is_empty() {
        vec![Line::from("Save first (Ctrl+S) to get shareable links.")]
    } else {
        let mut lines = vec![
            Line::from(Span::styled("Edit URL", label)),
            Line::from(session.edit_url()),
            Line::from(""),
            Line::from(Span::styled("Image URL", label)),
            Line::from(session.image_url()),
            Line::from(""),
            Line::from(Span::styled("HTML", label)),
            Line::from(session.html_image()),
        ];
        let replot = session.replot_example();
        if !replot.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Replot API", label)));
            lines.push(Line::from(replot));
        }
        lines
    };

    let paragraph = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Share (any key to close)")
                .title_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, popup_area);
}
