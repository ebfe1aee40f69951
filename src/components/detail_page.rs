use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use tui_dispatch::{DataResource, EventKind};
use tui_dispatch_components::{
    SelectList, SelectListBehavior, SelectListProps, StatusBar, StatusBarHint,
};

use super::panels::{render_error, render_footer, render_loading, render_notice};
use super::theme::{
    format_name, list_style, panel_style, type_chip_style, ACCENT_GOLD, ACCENT_TEAL, BG_BASE,
    TEXT_DIM, TEXT_MAIN,
};
use super::Component;
use crate::action::Action;
use crate::generations::{generation_label, visible_generations};
use crate::model::{PokemonDetails, Stat};
use crate::sprite::{kitty_sequence, sprite_fit};
use crate::sprite_backend::{place_sprite, EVOLUTION_SPRITE_ID, PRIMARY_SPRITE_ID};
use crate::state::AppState;

pub const NO_GENERATIONS_TEXT: &str = "No valid generations data available";
pub const NO_EVOLUTION_TEXT: &str = "No evolution data available";
pub const SPRITE_LOADING_TEXT: &str = "[loading sprite]";
pub const NO_SPRITE_TEXT: &str = "[no sprite]";

pub struct DetailPageProps<'a> {
    pub state: &'a AppState,
    pub is_focused: bool,
}

pub struct DetailPage {
    evolution_list: SelectList,
    status_bar: StatusBar,
}

impl DetailPage {
    pub fn new() -> Self {
        Self {
            evolution_list: SelectList::new(),
            status_bar: StatusBar::new(),
        }
    }
}

impl Default for DetailPage {
    fn default() -> Self {
        Self::new()
    }
}

impl Component<Action> for DetailPage {
    type Props<'a> = DetailPageProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        if !props.is_focused {
            return Vec::new();
        }
        let EventKind::Key(key) = event else {
            return Vec::new();
        };
        match key.code {
            KeyCode::Char('b') | KeyCode::Backspace => vec![Action::DetailBack],
            KeyCode::Char('h') | KeyCode::Home => vec![Action::DetailHome],
            KeyCode::Char('r') | KeyCode::F(5) => vec![Action::DetailRetry],
            KeyCode::Enter => vec![Action::EvolutionOpen],
            _ => {
                let items = evolution_items(props.state);
                if items.is_empty() {
                    return Vec::new();
                }
                let list_props = SelectListProps {
                    items: &items,
                    count: items.len(),
                    selected: props
                        .state
                        .evolution_selected_index
                        .min(items.len().saturating_sub(1)),
                    is_focused: true,
                    style: list_style(),
                    behavior: SelectListBehavior {
                        show_scrollbar: false,
                        wrap_navigation: false,
                    },
                    on_select: Action::EvolutionSelect,
                    render_item: &|item| item.clone(),
                };
                self.evolution_list
                    .handle_event(event, list_props)
                    .into_iter()
                    .collect()
            }
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: DetailPageProps<'_>) {
        let state = props.state;
        frame.render_widget(Block::default().style(Style::default().bg(BG_BASE)), area);
        let layout = Layout::vertical([Constraint::Min(6), Constraint::Length(3)]).split(area);

        match &state.detail {
            DataResource::Empty => {}
            DataResource::Loading => {
                let block = Block::default()
                    .borders(Borders::ALL)
                    .title(title_for_id(state))
                    .style(panel_style());
                let inner = block.inner(layout[0]);
                frame.render_widget(block, layout[0]);
                render_loading(frame, inner, state.tick);
            }
            DataResource::Failed(error) => render_error(
                frame,
                layout[0],
                error,
                "Press r to retry, b to go back, h for the list.",
            ),
            DataResource::Loaded(details) => {
                self.render_details(frame, layout[0], state, details, props.is_focused)
            }
        }

        let hints = [
            StatusBarHint::new("j/k", "Evolution"),
            StatusBarHint::new("Enter", "Open"),
            StatusBarHint::new("b", "Back"),
            StatusBarHint::new("h", "Home"),
            StatusBarHint::new("q", "Quit"),
        ];
        let status = state.message.clone().unwrap_or_default();
        render_footer(frame, layout[1], &mut self.status_bar, &hints, &status);
    }
}

impl DetailPage {
    fn render_details(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        details: &PokemonDetails,
        is_focused: bool,
    ) {
        let record = &details.record;
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("{} #{:03}", format_name(&record.name), record.id))
            .style(panel_style())
            .border_style(Style::default().fg(ACCENT_TEAL));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let columns =
            Layout::horizontal([Constraint::Percentage(58), Constraint::Percentage(42)])
                .split(inner);
        let left = Layout::vertical([Constraint::Min(5), Constraint::Length(8)]).split(columns[0]);

        let profile =
            Layout::horizontal([Constraint::Length(20), Constraint::Min(20)]).split(left[0]);
        let sprite_block = Block::default()
            .borders(Borders::ALL)
            .style(Style::default().fg(TEXT_DIM));
        let sprite_area = sprite_block.inner(profile[0]);
        frame.render_widget(sprite_block, profile[0]);
        render_sprite(
            frame,
            sprite_area,
            state,
            record.primary_sprite_url.as_deref(),
            PRIMARY_SPRITE_ID,
        );
        frame.render_widget(
            Paragraph::new(profile_text(details)).wrap(Wrap { trim: true }),
            profile[1],
        );

        let stats_block = Block::default()
            .borders(Borders::ALL)
            .title("STATS")
            .style(Style::default().fg(TEXT_MAIN));
        frame.render_widget(
            Paragraph::new(stats_text(&record.stats)).block(stats_block),
            left[1],
        );

        let evo_block = Block::default()
            .borders(Borders::ALL)
            .title("EVOLUTION")
            .style(panel_style());
        let evo_inner = evo_block.inner(columns[1]);
        frame.render_widget(evo_block, columns[1]);

        let items = evolution_items(state);
        if items.is_empty() {
            render_notice(frame, evo_inner, NO_EVOLUTION_TEXT);
            return;
        }
        let evo_layout = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(8),
        ])
        .split(evo_inner);
        frame.render_widget(
            Paragraph::new(chain_text(details))
                .style(Style::default().fg(ACCENT_GOLD))
                .wrap(Wrap { trim: true }),
            evo_layout[0],
        );
        let list_props = SelectListProps {
            items: &items,
            count: items.len(),
            selected: state
                .evolution_selected_index
                .min(items.len().saturating_sub(1)),
            is_focused,
            style: list_style(),
            behavior: SelectListBehavior {
                show_scrollbar: false,
                wrap_navigation: false,
            },
            on_select: Action::EvolutionSelect,
            render_item: &|item| item.clone(),
        };
        self.evolution_list.render(frame, evo_layout[1], list_props);

        let selected_image = details
            .evolution_chain
            .get(state.evolution_selected_index)
            .map(|node| node.image_url.as_str());
        render_sprite(frame, evo_layout[2], state, selected_image, EVOLUTION_SPRITE_ID);
    }
}

/// Place the image at `url` centred in `area`, or a placeholder until it loads.
fn render_sprite(frame: &mut Frame, area: Rect, state: &AppState, url: Option<&str>, id: u32) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let resource = url.and_then(|url| state.sprite(url));
    if let Some(DataResource::Loaded(sprite)) = resource {
        let (cols, rows) = sprite_fit(sprite, area.width, area.height);
        if let Ok(sequence) = kitty_sequence(sprite, cols, rows, id) {
            let x = area.x.saturating_add(area.width.saturating_sub(cols) / 2);
            let y = area.y.saturating_add(area.height.saturating_sub(rows) / 2);
            place_sprite(id, x, y, sequence);
            return;
        }
    }
    let placeholder = match resource {
        Some(DataResource::Loading) => SPRITE_LOADING_TEXT,
        _ => NO_SPRITE_TEXT,
    };
    frame.render_widget(
        Paragraph::new(placeholder)
            .alignment(Alignment::Center)
            .style(Style::default().fg(TEXT_DIM)),
        area,
    );
}

fn title_for_id(state: &AppState) -> String {
    match state.detail_id() {
        Some(id) => format!("#{id:03}"),
        None => String::new(),
    }
}

fn profile_text(details: &PokemonDetails) -> Text<'static> {
    let label = Style::default().fg(TEXT_DIM).add_modifier(Modifier::BOLD);
    let mut lines = Vec::new();

    let mut types = vec![Span::styled("Types: ", label)];
    for type_name in &details.record.types {
        types.push(Span::styled(
            format!(" {} ", type_name.to_uppercase()),
            type_chip_style(type_name),
        ));
        types.push(Span::raw(" "));
    }
    lines.push(Line::from(types));
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled("Generations:", label)));
    let visible = visible_generations(&details.generations);
    if visible.is_empty() {
        lines.push(Line::from(Span::styled(
            NO_GENERATIONS_TEXT,
            Style::default().fg(TEXT_DIM),
        )));
    }
    for (generation, variants) in &visible {
        let games: Vec<&str> = variants
            .iter()
            .filter(|(_, sprites)| sprites.values().any(Option::is_some))
            .map(|(game, _)| game.as_str())
            .collect();
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {}: ", generation_label(generation)),
                Style::default().fg(ACCENT_TEAL),
            ),
            Span::raw(games.join(", ")),
        ]));
    }
    Text::from(lines)
}

fn chain_text(details: &PokemonDetails) -> String {
    details
        .evolution_chain
        .iter()
        .map(|node| format_name(&node.name))
        .collect::<Vec<_>>()
        .join(" → ")
}

fn stats_text(stats: &[Stat]) -> Text<'static> {
    if stats.is_empty() {
        return Text::from("No stats.");
    }
    Text::from(
        stats
            .iter()
            .map(|stat| Line::from(render_stat(stat)))
            .collect::<Vec<_>>(),
    )
}

fn render_stat(stat: &Stat) -> String {
    let bar = "#".repeat((stat.base_value as usize / 10).clamp(1, 20));
    format!(
        "{:>4} {:>3} {bar}",
        shorten_stat(&stat.name),
        stat.base_value
    )
}

fn shorten_stat(name: &str) -> String {
    match name {
        "hp" => "HP".to_string(),
        "attack" => "ATK".to_string(),
        "defense" => "DEF".to_string(),
        "special-attack" => "SAT".to_string(),
        "special-defense" => "SDF".to_string(),
        "speed" => "SPD".to_string(),
        _ => name.to_ascii_uppercase(),
    }
}

fn evolution_items(state: &AppState) -> Vec<Line<'static>> {
    let Some(details) = state.current_details() else {
        return Vec::new();
    };
    let current = state.detail_id();
    details
        .evolution_chain
        .iter()
        .enumerate()
        .map(|(idx, node)| {
            let marker = if Some(node.id) == current { "*" } else { " " };
            Line::from(format!(
                "{marker} {:02} {} #{:03}",
                idx + 1,
                format_name(&node.name),
                node.id
            ))
        })
        .collect()
}
