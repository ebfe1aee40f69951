//! Small render helpers shared by both pages.

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use tui_dispatch_components::{
    StatusBar, StatusBarHint, StatusBarItem, StatusBarProps, StatusBarSection,
};

use super::theme::{panel_style, spinner, status_bar_style, ACCENT_GOLD, ERROR_RED, TEXT_DIM};
use super::Component;
use crate::action::Action;

pub fn render_loading(frame: &mut Frame, area: Rect, tick: u64) {
    let text = format!("{} Loading...", spinner(tick));
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(ACCENT_GOLD)),
        area,
    );
}

pub fn render_notice(frame: &mut Frame, area: Rect, message: &str) {
    frame.render_widget(
        Paragraph::new(message.to_string())
            .style(Style::default().fg(TEXT_DIM))
            .wrap(Wrap { trim: true }),
        area,
    );
}

/// Bordered error panel, distinct from the loading and empty states.
pub fn render_error(frame: &mut Frame, area: Rect, error: &str, hint: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("ERROR")
        .style(panel_style())
        .border_style(Style::default().fg(ERROR_RED));
    let text = Text::from(vec![
        Line::from(vec![
            Span::styled(
                "Error: ",
                Style::default().fg(ERROR_RED).add_modifier(Modifier::BOLD),
            ),
            Span::raw(error.to_string()),
        ]),
        Line::from(""),
        Line::from(Span::styled(hint.to_string(), Style::default().fg(TEXT_DIM))),
    ]);
    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

pub fn render_footer(
    frame: &mut Frame,
    area: Rect,
    status_bar: &mut StatusBar,
    hints: &[StatusBarHint<'_>],
    status: &str,
) {
    let status_span = Span::styled(status, Style::default().fg(ACCENT_GOLD));
    let status_items = [StatusBarItem::span(status_span)];
    let props = StatusBarProps {
        left: StatusBarSection::hints(hints).with_separator("  "),
        center: StatusBarSection::empty(),
        right: StatusBarSection::items(&status_items).with_separator("  "),
        style: status_bar_style(),
        is_focused: false,
    };
    Component::<Action>::render(status_bar, frame, area, props);
}
