use crossterm::event::KeyCode;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use tui_dispatch::{DataResource, EventKind};
use tui_dispatch_components::{
    SelectList, SelectListBehavior, SelectListProps, StatusBar, StatusBarHint,
};

use super::panels::{render_error, render_footer, render_loading, render_notice};
use super::theme::{
    format_name, list_style, panel_style, type_chip_style, ACCENT_GOLD, ACCENT_TEAL, BG_BASE,
    TEXT_DIM,
};
use super::Component;
use crate::action::Action;
use crate::generations::generation_label;
use crate::model::EnrichedSummaryRecord;
use crate::state::AppState;

pub const EMPTY_LIST_TEXT: &str = "No Pokémon found";

pub struct ListPageProps<'a> {
    pub state: &'a AppState,
    pub is_focused: bool,
}

/// Filter controls, the filtered table and the footer.
pub struct ListPage {
    list: SelectList,
    status_bar: StatusBar,
}

impl ListPage {
    pub fn new() -> Self {
        Self {
            list: SelectList::new(),
            status_bar: StatusBar::new(),
        }
    }
}

impl Default for ListPage {
    fn default() -> Self {
        Self::new()
    }
}

impl Component<Action> for ListPage {
    type Props<'a> = ListPageProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        if !props.is_focused {
            return Vec::new();
        }
        let state = props.state;
        match event {
            EventKind::Key(key) if state.search_active => match key.code {
                KeyCode::Esc => vec![Action::SearchCancel],
                KeyCode::Enter => vec![Action::SearchSubmit],
                KeyCode::Backspace => vec![Action::SearchBackspace],
                KeyCode::Char(ch) => vec![Action::SearchInput(ch)],
                _ => Vec::new(),
            },
            EventKind::Key(key) => match key.code {
                KeyCode::Char('/') => vec![Action::SearchStart],
                KeyCode::Esc => vec![Action::SearchCancel],
                KeyCode::Char('[') => vec![Action::TypeFilterPrev],
                KeyCode::Char(']') => vec![Action::TypeFilterNext],
                KeyCode::Char('{') => vec![Action::GenerationFilterPrev],
                KeyCode::Char('}') => vec![Action::GenerationFilterNext],
                KeyCode::Char('c') => vec![Action::FiltersClear],
                KeyCode::Char('r') | KeyCode::F(5) => vec![Action::ListRefresh],
                KeyCode::Enter => vec![Action::ListOpenSelected],
                KeyCode::PageDown => vec![Action::SelectionPage(1)],
                KeyCode::PageUp => vec![Action::SelectionPage(-1)],
                KeyCode::Home | KeyCode::Char('g') => vec![Action::SelectionJumpTop],
                KeyCode::End | KeyCode::Char('G') => vec![Action::SelectionJumpBottom],
                _ => {
                    let items = row_items(state);
                    if items.is_empty() {
                        return Vec::new();
                    }
                    let props = SelectListProps {
                        items: &items,
                        count: items.len(),
                        selected: state.selected_index.min(items.len().saturating_sub(1)),
                        is_focused: true,
                        style: list_style(),
                        behavior: SelectListBehavior {
                            show_scrollbar: true,
                            wrap_navigation: false,
                        },
                        on_select: Action::ListSelect,
                        render_item: &|item| item.clone(),
                    };
                    self.list.handle_event(event, props).into_iter().collect()
                }
            },
            EventKind::Scroll { delta, .. } => vec![Action::SelectionMove((*delta * 3) as i16)],
            _ => Vec::new(),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: ListPageProps<'_>) {
        let state = props.state;
        frame.render_widget(Block::default().style(Style::default().bg(BG_BASE)), area);
        let layout = Layout::vertical([
            Constraint::Length(4),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(area);

        render_filters(frame, layout[0], state);

        let block = Block::default()
            .borders(Borders::ALL)
            .title("POKEDEX")
            .style(panel_style())
            .border_style(Style::default().fg(if props.is_focused {
                ACCENT_TEAL
            } else {
                TEXT_DIM
            }));
        let inner = block.inner(layout[1]);
        frame.render_widget(block, layout[1]);

        match &state.list {
            DataResource::Empty => {}
            DataResource::Loading => render_loading(frame, inner, state.tick),
            DataResource::Failed(error) => {
                render_error(frame, inner, error, "Press r to retry.")
            }
            DataResource::Loaded(_) => {
                let items = row_items(state);
                if items.is_empty() {
                    render_notice(frame, inner, EMPTY_LIST_TEXT);
                } else {
                    let table = Layout::vertical([Constraint::Length(1), Constraint::Min(1)])
                        .split(inner);
                    frame.render_widget(
                        Paragraph::new(Line::from(Span::styled(
                            format!("  {:<6}{:<16}{}", "ID", "NAME", "TYPES"),
                            Style::default().fg(TEXT_DIM).add_modifier(Modifier::BOLD),
                        ))),
                        table[0],
                    );
                    let list_props = SelectListProps {
                        items: &items,
                        count: items.len(),
                        selected: state.selected_index.min(items.len().saturating_sub(1)),
                        is_focused: props.is_focused,
                        style: list_style(),
                        behavior: SelectListBehavior {
                            show_scrollbar: true,
                            wrap_navigation: false,
                        },
                        on_select: Action::ListSelect,
                        render_item: &|item| item.clone(),
                    };
                    self.list.render(frame, table[1], list_props);
                }
            }
        }

        render_footer(
            frame,
            layout[2],
            &mut self.status_bar,
            &hints(state),
            &list_status(state),
        );
    }
}

fn render_filters(frame: &mut Frame, area: Rect, state: &AppState) {
    let filters = &state.filters;
    let type_label = if filters.type_filter.is_empty() {
        "All types".to_string()
    } else {
        format_name(&filters.type_filter)
    };
    let generation_label = if filters.generation_filter.is_empty() {
        "All generations".to_string()
    } else {
        generation_label(&filters.generation_filter)
    };
    let search = if state.search_active {
        format!("/{}_", state.search_query)
    } else if filters.search.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", filters.search)
    };
    let text = Text::from(vec![Line::from(vec![
        Span::raw("Type: "),
        Span::styled(type_label, Style::default().fg(ACCENT_GOLD)),
        Span::raw("  |  Generation: "),
        Span::styled(generation_label, Style::default().fg(ACCENT_GOLD)),
        Span::raw("  |  Search: "),
        Span::styled(search, Style::default().fg(ACCENT_TEAL)),
    ])]);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("FILTERS")
        .style(panel_style());
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn row_items(state: &AppState) -> Vec<Line<'static>> {
    state.visible_records().into_iter().map(row_line).collect()
}

fn row_line(record: &EnrichedSummaryRecord) -> Line<'static> {
    let mut spans = vec![
        Span::raw(format!("#{:03}  ", record.id)),
        Span::raw(format!("{:<16}", format_name(&record.name))),
    ];
    for type_name in &record.types {
        spans.push(Span::styled(
            format!(" {} ", type_name.to_uppercase()),
            type_chip_style(type_name),
        ));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn hints(state: &AppState) -> Vec<StatusBarHint<'static>> {
    if state.search_active {
        return vec![
            StatusBarHint::new("Enter", "Apply"),
            StatusBarHint::new("Esc", "Clear"),
            StatusBarHint::new("Bksp", "Delete"),
        ];
    }
    vec![
        StatusBarHint::new("j/k", "Move"),
        StatusBarHint::new("Enter", "Open"),
        StatusBarHint::new("/", "Search"),
        StatusBarHint::new("[ ]", "Type"),
        StatusBarHint::new("{ }", "Gen"),
        StatusBarHint::new("c", "Clear"),
        StatusBarHint::new("r", "Refresh"),
        StatusBarHint::new("q", "Quit"),
    ]
}

fn list_status(state: &AppState) -> String {
    if let Some(message) = &state.message {
        return message.clone();
    }
    let total = state.records().len();
    let shown = state.visible_records().len();
    match state.list_failures.len() {
        0 => format!("{shown}/{total}"),
        skipped => format!("{shown}/{total}  ({skipped} skipped)"),
    }
}
