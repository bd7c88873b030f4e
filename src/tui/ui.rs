use crate::core::state::App;
use crate::stream::{ChatMessage, Role};
use crate::tui::TuiState;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Paragraph, Wrap};

const SPINNER: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    use Constraint::{Length, Min};
    let layout = Layout::vertical([Min(0), Length(3), Length(1)]);
    let [main_area, input_area, status_area] = layout.areas(frame.area());

    draw_conversation(frame, main_area, app, tui, spinner_frame);
    draw_input(frame, input_area, app, tui);

    let spinner = if app.busy {
        format!("{} ", SPINNER[spinner_frame % SPINNER.len()])
    } else {
        String::new()
    };
    let status = format!(
        " {}{} | {} messages | Enter: envoyer  Esc: annuler  Ctrl+L: effacer  Ctrl+E: exporter",
        spinner,
        app.status_message,
        app.conversation.len()
    );
    frame.render_widget(
        Span::styled(status, Style::default().add_modifier(Modifier::DIM)),
        status_area,
    );
}

fn role_style(message: &ChatMessage) -> Style {
    if message.is_error {
        return Style::default().fg(Color::Red);
    }
    match message.role {
        Role::User => Style::default().fg(Color::Cyan),
        Role::Assistant => Style::default().fg(Color::Green),
    }
}

fn role_title(role: Role) -> &'static str {
    match role {
        Role::User => "Vous",
        Role::Assistant => "Dalil",
    }
}

fn conversation_text<'a>(app: &'a App, spinner_frame: usize) -> Text<'a> {
    let mut lines: Vec<Line<'a>> = Vec::new();
    for message in app.conversation.iter() {
        let style = role_style(message);
        let time = message.created_at.format("%H:%M");
        lines.push(Line::from(vec![
            Span::styled(role_title(message.role), style.add_modifier(Modifier::BOLD)),
            Span::styled(format!("  {time}"), Style::default().add_modifier(Modifier::DIM)),
        ]));

        let is_live = app.live_reply.as_deref() == Some(message.id.as_str());
        if message.content.is_empty() && is_live {
            lines.push(Line::from(format!("{} ...", SPINNER[spinner_frame % SPINNER.len()])));
        } else {
            let content_style = if message.is_error { style } else { Style::default() };
            lines.extend(
                message
                    .content
                    .lines()
                    .map(|l| Line::styled(l, content_style)),
            );
        }
        lines.push(Line::default());
    }
    Text::from(lines)
}

fn draw_conversation(frame: &mut Frame, area: Rect, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    let paragraph = Paragraph::new(conversation_text(app, spinner_frame)).wrap(Wrap { trim: false });

    // Stick to the bottom unless the user scrolled back
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    let total_lines = paragraph.line_count(inner_width);
    let offset = scroll_offset(total_lines, inner_height, &mut tui.scroll_back);

    let title = if tui.scroll_back > 0 { " Dalil ↑ " } else { " Dalil " };
    let paragraph = paragraph
        .block(Block::bordered().title(title))
        .scroll((offset, 0));
    frame.render_widget(paragraph, area);
}

/// Top row to show so the last line sits at the bottom, minus `scroll_back`.
/// Clamps `scroll_back` to what can actually be scrolled.
fn scroll_offset(total_lines: usize, inner_height: u16, scroll_back: &mut u16) -> u16 {
    let total = u16::try_from(total_lines).unwrap_or(u16::MAX);
    let max_scroll = total.saturating_sub(inner_height);
    *scroll_back = (*scroll_back).min(max_scroll);
    max_scroll - *scroll_back
}

fn draw_input(frame: &mut Frame, area: Rect, app: &App, tui: &TuiState) {
    let (title, border) = if app.busy {
        (" Réponse en cours... ", Style::default().add_modifier(Modifier::DIM))
    } else {
        (" Votre question ", Style::default())
    };
    let input = Paragraph::new(tui.input.as_str())
        .block(Block::bordered().title(title).border_style(border));
    frame.render_widget(input, area);

    let text_width = Line::from(tui.input.as_str()).width() as u16;
    let max_x = area.width.saturating_sub(2);
    frame.set_cursor_position((area.x + 1 + text_width.min(max_x), area.y + 1));
}
