use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Borders;
use tui_dispatch_components::style::BorderStyle;
use tui_dispatch_components::{
    BaseStyle, Padding, SelectListStyle, SelectionStyle, StatusBarStyle,
};

pub const BG_BASE: Color = Color::Rgb(12, 18, 28);
pub const BG_PANEL: Color = Color::Rgb(20, 32, 46);
pub const BG_HIGHLIGHT: Color = Color::Rgb(28, 92, 110);
pub const TEXT_MAIN: Color = Color::Rgb(232, 242, 244);
pub const TEXT_DIM: Color = Color::Rgb(176, 195, 207);
pub const ACCENT_TEAL: Color = Color::Rgb(72, 204, 184);
pub const ACCENT_GOLD: Color = Color::Rgb(228, 176, 88);
pub const ERROR_RED: Color = Color::Rgb(232, 96, 96);

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Chip colour for a type name; unlisted types fall back to white.
pub fn type_color(type_name: &str) -> Color {
    match type_name {
        "fire" => Color::Rgb(0xF0, 0x80, 0x30),
        "water" => Color::Rgb(0x63, 0x90, 0xF0),
        "grass" => Color::Rgb(0x7A, 0xC7, 0x4C),
        "normal" => Color::Rgb(0xA8, 0xA7, 0x7A),
        "fighting" => Color::Rgb(0xC2, 0x2E, 0x28),
        "flying" => Color::Rgb(0xA9, 0x8F, 0xF3),
        "rock" => Color::Rgb(0xB6, 0xA1, 0x36),
        "steel" => Color::Rgb(0xB7, 0xB7, 0xCE),
        "ground" => Color::Rgb(0xE2, 0xBF, 0x65),
        "bug" => Color::Rgb(0xA6, 0xB9, 0x1A),
        "poison" => Color::Rgb(0xA3, 0x3E, 0xA1),
        "electric" => Color::Rgb(0xF7, 0xD0, 0x2C),
        "ghost" => Color::Rgb(0x73, 0x57, 0x97),
        "psychic" => Color::Rgb(0xF9, 0x55, 0x87),
        "ice" => Color::Rgb(0x96, 0xD9, 0xD6),
        "dragon" => Color::Rgb(0x6F, 0x35, 0xFC),
        "dark" => Color::Rgb(0x70, 0x57, 0x46),
        "fairy" => Color::Rgb(0xD6, 0x85, 0xAD),
        "unknown" => Color::Rgb(0xBD, 0xBD, 0xBD),
        _ => Color::Rgb(0xFF, 0xFF, 0xFF),
    }
}

pub fn type_chip_style(type_name: &str) -> Style {
    Style::default()
        .bg(type_color(type_name))
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

/// `mr-mime` → `Mr Mime`.
pub fn format_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn spinner(tick: u64) -> &'static str {
    SPINNER[(tick % SPINNER.len() as u64) as usize]
}

pub fn panel_style() -> Style {
    Style::default().bg(BG_PANEL).fg(TEXT_MAIN)
}

pub fn list_style() -> SelectListStyle {
    SelectListStyle {
        base: BaseStyle {
            border: None,
            padding: Padding::xy(1, 0),
            bg: Some(BG_PANEL),
            fg: Some(TEXT_MAIN),
        },
        selection: SelectionStyle {
            style: Some(
                Style::default()
                    .bg(BG_HIGHLIGHT)
                    .fg(TEXT_MAIN)
                    .add_modifier(Modifier::BOLD),
            ),
            marker: None,
            disabled: false,
        },
        ..SelectListStyle::default()
    }
}

pub fn status_bar_style() -> StatusBarStyle {
    StatusBarStyle {
        base: BaseStyle {
            border: Some(BorderStyle {
                borders: Borders::ALL,
                style: Style::default().fg(TEXT_DIM),
                focused_style: Some(Style::default().fg(ACCENT_TEAL)),
            }),
            padding: Padding::xy(1, 0),
            bg: Some(BG_PANEL),
            fg: Some(TEXT_MAIN),
        },
        text: Style::default().fg(TEXT_DIM),
        hint_key: Style::default()
            .fg(ACCENT_TEAL)
            .add_modifier(Modifier::BOLD),
        hint_label: Style::default().fg(TEXT_DIM),
        separator: Style::default().fg(TEXT_DIM),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_hyphenated_names() {
        assert_eq!(format_name("charmander"), "Charmander");
        assert_eq!(format_name("mr-mime"), "Mr Mime");
    }

    #[test]
    fn unknown_type_falls_back_to_white() {
        assert_eq!(type_color("fire"), Color::Rgb(0xF0, 0x80, 0x30));
        assert_eq!(type_color("shadow"), Color::Rgb(0xFF, 0xFF, 0xFF));
    }
}
