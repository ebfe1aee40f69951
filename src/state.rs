//! Application state: the list, the current detail page and the filter store.

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tui_dispatch::DataResource;
use tui_dispatch_debug::debug::{ron_string, DebugSection, DebugState};

use crate::filter::filter_records;
use crate::model::{EnrichedSummaryRecord, FetchFailure, PokemonDetails};
use crate::sprite::Sprite;

/// List filter criteria. An empty string disables that criterion.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FilterState {
    pub type_filter: String,
    pub generation_filter: String,
    pub search: String,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.type_filter.is_empty() && self.generation_filter.is_empty() && self.search.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Route {
    #[default]
    List,
    Detail(u32),
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppState {
    pub terminal_size: (u16, u16),
    pub route: Route,
    /// Routes to return to with `DetailBack`, most recent last.
    pub history: Vec<Route>,

    pub list: DataResource<Vec<EnrichedSummaryRecord>>,
    pub list_failures: Vec<FetchFailure>,
    pub selected_index: usize,

    pub filters: FilterState,
    pub search_query: String,
    pub search_active: bool,

    /// Every detail result received, keyed by id, including ones that
    /// arrived after the user navigated away.
    pub details: HashMap<u32, PokemonDetails>,
    pub detail: DataResource<PokemonDetails>,
    pub evolution_selected_index: usize,
    /// Decoded images keyed by URL.
    pub sprites: HashMap<String, DataResource<Sprite>>,

    pub message: Option<String>,
    pub tick: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            terminal_size: (80, 24),
            route: Route::List,
            history: Vec::new(),
            list: DataResource::Empty,
            list_failures: Vec::new(),
            selected_index: 0,
            filters: FilterState::default(),
            search_query: String::new(),
            search_active: false,
            details: HashMap::new(),
            detail: DataResource::Empty,
            evolution_selected_index: 0,
            sprites: HashMap::new(),
            message: None,
            tick: 0,
        }
    }
}

impl AppState {
    /// State that starts on the detail page for `id`, with the list behind it.
    pub fn opened_at(id: u32) -> Self {
        Self {
            route: Route::Detail(id),
            history: vec![Route::List],
            ..Self::default()
        }
    }

    pub fn detail_id(&self) -> Option<u32> {
        match self.route {
            Route::Detail(id) => Some(id),
            Route::List => None,
        }
    }

    pub fn records(&self) -> &[EnrichedSummaryRecord] {
        self.list.data().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn visible_records(&self) -> Vec<&EnrichedSummaryRecord> {
        filter_records(self.records(), &self.filters)
    }

    pub fn selected_record(&self) -> Option<&EnrichedSummaryRecord> {
        self.visible_records().get(self.selected_index).copied()
    }

    pub fn set_selected_index(&mut self, index: usize) -> bool {
        let count = self.visible_records().len();
        if count == 0 {
            self.selected_index = 0;
            return false;
        }
        let bounded = index.min(count - 1);
        if bounded != self.selected_index {
            self.selected_index = bounded;
            return true;
        }
        false
    }

    pub fn clamp_selection(&mut self) {
        if self.selected_index >= self.visible_records().len() {
            self.selected_index = 0;
        }
    }

    /// Replace the whole filter state. The search text follows
    /// `filters.search`, so both stay in sync in either direction.
    pub fn set_filters(&mut self, filters: FilterState) -> bool {
        if self.filters == filters && self.search_query == filters.search {
            return false;
        }
        self.search_query = filters.search.clone();
        self.filters = filters;
        self.clamp_selection();
        true
    }

    /// Update the search text; the filter's search criterion follows it.
    pub fn set_search_query(&mut self, query: String) -> bool {
        if self.search_query == query && self.filters.search == query {
            return false;
        }
        self.filters.search = query.clone();
        self.search_query = query;
        self.clamp_selection();
        true
    }

    pub fn current_details(&self) -> Option<&PokemonDetails> {
        self.detail.data()
    }

    pub fn sprite(&self, url: &str) -> Option<&DataResource<Sprite>> {
        self.sprites.get(url)
    }

    /// URLs of every image the current detail page shows.
    pub fn detail_sprite_urls(&self) -> Vec<String> {
        let Some(details) = self.current_details() else {
            return Vec::new();
        };
        details
            .record
            .primary_sprite_url
            .iter()
            .cloned()
            .chain(details.evolution_chain.iter().map(|node| node.image_url.clone()))
            .collect()
    }

    pub fn is_loading(&self) -> bool {
        self.list.is_loading() || self.detail.is_loading()
    }
}

impl DebugState for AppState {
    fn debug_sections(&self) -> Vec<DebugSection> {
        vec![
            DebugSection::new("Route")
                .entry("current", ron_string(&self.route))
                .entry("history", ron_string(&self.history)),
            DebugSection::new("List")
                .entry("loading", ron_string(&self.list.is_loading()))
                .entry("error", ron_string(&self.list.error()))
                .entry("total", ron_string(&self.records().len()))
                .entry("visible", ron_string(&self.visible_records().len()))
                .entry("skipped", ron_string(&self.list_failures.len()))
                .entry("selected", ron_string(&self.selected_index)),
            DebugSection::new("Filters")
                .entry("type", ron_string(&self.filters.type_filter))
                .entry("generation", ron_string(&self.filters.generation_filter))
                .entry("search", ron_string(&self.filters.search))
                .entry("search_query", ron_string(&self.search_query))
                .entry("search_active", ron_string(&self.search_active)),
            DebugSection::new("Detail")
                .entry("loading", ron_string(&self.detail.is_loading()))
                .entry("error", ron_string(&self.detail.error()))
                .entry(
                    "name",
                    ron_string(&self.current_details().map(|d| d.record.name.clone())),
                )
                .entry("cached", ron_string(&self.details.len()))
                .entry("evolution_index", ron_string(&self.evolution_selected_index))
                .entry("sprites", ron_string(&self.sprites.len())),
            DebugSection::new("Status").entry("message", ron_string(&self.message)),
        ]
    }
}
