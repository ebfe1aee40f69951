pub mod detail_page;
pub mod list_page;
pub mod panels;
pub mod theme;

pub use tui_dispatch::Component;

pub use detail_page::{
    DetailPage, DetailPageProps, NO_EVOLUTION_TEXT, NO_GENERATIONS_TEXT, NO_SPRITE_TEXT,
    SPRITE_LOADING_TEXT,
};
pub use list_page::{ListPage, ListPageProps, EMPTY_LIST_TEXT};
