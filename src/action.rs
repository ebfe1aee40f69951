//! Actions dispatched by input handlers, subscriptions and effect tasks.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{EnrichedList, PokemonDetails};
use crate::sprite::Sprite;
use crate::state::FilterState;

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[action(infer_categories)]
pub enum Action {
    Init,

    // ===== List =====
    ListRefresh,
    ListDidLoad(EnrichedList),
    ListDidError(String),

    // ===== Selection =====
    SelectionMove(i16),
    SelectionPage(i16),
    SelectionJumpTop,
    SelectionJumpBottom,
    ListSelect(usize),
    /// Open the detail page for the selected list row.
    ListOpenSelected,

    // ===== Detail =====
    DetailOpen(u32),
    DetailDidLoad(PokemonDetails),
    DetailDidError { id: u32, error: String },
    DetailRetry,
    DetailBack,
    DetailHome,

    // ===== Evolution =====
    EvolutionSelect(usize),
    /// Open the detail page for the selected evolution node.
    EvolutionOpen,

    // ===== Sprites =====
    SpriteDidLoad { url: String, sprite: Sprite },
    SpriteDidError { url: String, error: String },

    // ===== Filters =====
    /// Replace all filters; the search text follows `search`.
    FiltersSet(FilterState),
    FiltersClear,
    SearchQuerySet(String),
    TypeFilterNext,
    TypeFilterPrev,
    GenerationFilterNext,
    GenerationFilterPrev,

    // ===== Search input =====
    SearchStart,
    SearchCancel,
    SearchSubmit,
    SearchInput(char),
    SearchBackspace,

    UiTerminalResize(u16, u16),
    Tick,
    Quit,
}
