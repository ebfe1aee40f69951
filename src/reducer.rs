use tui_dispatch::{DataResource, DispatchResult};

use crate::action::Action;
use crate::effect::Effect;
use crate::filter::{cycle_option, GENERATION_OPTIONS, TYPE_OPTIONS};
use crate::state::{AppState, FilterState, Route};

pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::Init => {
            state.message = None;
            let mut effects = Vec::new();
            if !state.list.is_loaded() {
                state.list = DataResource::Loading;
                effects.push(Effect::LoadList { refresh: false });
            }
            if let Some(id) = state.detail_id() {
                effects.extend(show_detail(state, id));
            }
            DispatchResult::changed_with_many(effects)
        }

        Action::ListRefresh => {
            state.list = DataResource::Loading;
            state.list_failures.clear();
            state.message = None;
            DispatchResult::changed_with(Effect::LoadList { refresh: true })
        }

        Action::ListDidLoad(list) => {
            if !list.failures.is_empty() {
                tracing::warn!(skipped = list.failures.len(), "list loaded with skipped entries");
            }
            state.list = DataResource::Loaded(list.records);
            state.list_failures = list.failures;
            state.clamp_selection();
            DispatchResult::changed()
        }

        Action::ListDidError(error) => {
            tracing::error!(%error, "list load failed");
            state.list = DataResource::Failed(error);
            DispatchResult::changed()
        }

        Action::SelectionMove(delta) => {
            let index = (state.selected_index as i16 + delta).max(0);
            changed_if(state.set_selected_index(index as usize))
        }

        Action::SelectionPage(delta) => {
            let page = list_page_size(state) as i16;
            let index = (state.selected_index as i16 + delta * page).max(0);
            changed_if(state.set_selected_index(index as usize))
        }

        Action::SelectionJumpTop => changed_if(state.set_selected_index(0)),

        Action::SelectionJumpBottom => {
            let last = state.visible_records().len().saturating_sub(1);
            changed_if(state.set_selected_index(last))
        }

        Action::ListSelect(index) => changed_if(state.set_selected_index(index)),

        Action::ListOpenSelected => {
            let Some(id) = state.selected_record().map(|record| record.id) else {
                return DispatchResult::unchanged();
            };
            open_detail(state, id)
        }

        Action::DetailOpen(id) => {
            if id == 0 {
                return DispatchResult::unchanged();
            }
            open_detail(state, id)
        }

        Action::DetailDidLoad(details) => {
            let id = details.record.id;
            state.details.insert(id, details.clone());
            if state.detail_id() != Some(id) {
                tracing::debug!(id, "details arrived for a page no longer shown");
                return DispatchResult::unchanged();
            }
            state.detail = DataResource::Loaded(details);
            sync_evolution_selection(state);
            DispatchResult::changed_with_many(request_sprites(state))
        }

        Action::DetailDidError { id, error } => {
            if state.detail_id() != Some(id) {
                return DispatchResult::unchanged();
            }
            tracing::error!(id, %error, "detail load failed");
            state.detail = DataResource::Failed(error);
            DispatchResult::changed()
        }

        Action::DetailRetry => {
            let Some(id) = state.detail_id() else {
                return DispatchResult::unchanged();
            };
            if !state.detail.is_failed() {
                return DispatchResult::unchanged();
            }
            state.detail = DataResource::Loading;
            DispatchResult::changed_with(Effect::LoadDetail { id })
        }

        Action::DetailBack => {
            if state.route == Route::List {
                return DispatchResult::unchanged();
            }
            let previous = state.history.pop().unwrap_or(Route::List);
            state.route = previous;
            let mut effects = vec![Effect::CancelDetail];
            match previous {
                Route::Detail(id) => effects.extend(show_detail(state, id)),
                Route::List => state.detail = DataResource::Empty,
            }
            DispatchResult::changed_with_many(effects)
        }

        Action::DetailHome => {
            if state.route == Route::List {
                return DispatchResult::unchanged();
            }
            state.route = Route::List;
            state.history.clear();
            state.detail = DataResource::Empty;
            DispatchResult::changed_with(Effect::CancelDetail)
        }

        Action::EvolutionSelect(index) => {
            let count = state
                .current_details()
                .map(|details| details.evolution_chain.len())
                .unwrap_or(0);
            if count == 0 {
                return DispatchResult::unchanged();
            }
            let bounded = index.min(count - 1);
            if bounded == state.evolution_selected_index {
                return DispatchResult::unchanged();
            }
            state.evolution_selected_index = bounded;
            DispatchResult::changed()
        }

        Action::EvolutionOpen => {
            let Some(node_id) = state.current_details().and_then(|details| {
                details
                    .evolution_chain
                    .get(state.evolution_selected_index)
                    .map(|node| node.id)
            }) else {
                return DispatchResult::unchanged();
            };
            if state.detail_id() == Some(node_id) {
                return DispatchResult::unchanged();
            }
            open_detail(state, node_id)
        }

        Action::SpriteDidLoad { url, sprite } => {
            state.sprites.insert(url, DataResource::Loaded(sprite));
            DispatchResult::changed()
        }

        Action::SpriteDidError { url, error } => {
            tracing::warn!(%url, %error, "sprite load failed");
            state.sprites.insert(url, DataResource::Failed(error));
            DispatchResult::changed()
        }

        Action::FiltersSet(filters) => changed_if(state.set_filters(filters)),

        Action::FiltersClear => {
            if state.filters.is_empty() && state.search_query.is_empty() && !state.search_active {
                return DispatchResult::unchanged();
            }
            state.set_filters(FilterState::default());
            state.search_active = false;
            DispatchResult::changed()
        }

        Action::SearchQuerySet(query) => changed_if(state.set_search_query(query)),

        Action::TypeFilterNext => cycle_type(state, 1),
        Action::TypeFilterPrev => cycle_type(state, -1),
        Action::GenerationFilterNext => cycle_generation(state, 1),
        Action::GenerationFilterPrev => cycle_generation(state, -1),

        Action::SearchStart => {
            if state.search_active {
                return DispatchResult::unchanged();
            }
            state.search_active = true;
            DispatchResult::changed()
        }

        Action::SearchCancel => {
            if !state.search_active && state.search_query.is_empty() {
                return DispatchResult::unchanged();
            }
            state.search_active = false;
            state.set_search_query(String::new());
            DispatchResult::changed()
        }

        Action::SearchSubmit => {
            state.search_active = false;
            DispatchResult::changed()
        }

        Action::SearchInput(ch) => {
            let mut query = state.search_query.clone();
            query.push(ch);
            changed_if(state.set_search_query(query))
        }

        Action::SearchBackspace => {
            let mut query = state.search_query.clone();
            if query.pop().is_none() {
                return DispatchResult::unchanged();
            }
            changed_if(state.set_search_query(query))
        }

        Action::UiTerminalResize(width, height) => {
            if state.terminal_size != (width, height) {
                state.terminal_size = (width, height);
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::Tick => {
            if !state.is_loading() {
                return DispatchResult::unchanged();
            }
            state.tick = state.tick.wrapping_add(1);
            DispatchResult::changed()
        }

        Action::Quit => DispatchResult::unchanged(),
    }
}

fn changed_if(changed: bool) -> DispatchResult<Effect> {
    if changed {
        DispatchResult::changed()
    } else {
        DispatchResult::unchanged()
    }
}

fn open_detail(state: &mut AppState, id: u32) -> DispatchResult<Effect> {
    if state.route == Route::Detail(id) {
        return DispatchResult::unchanged();
    }
    state.history.push(state.route);
    state.route = Route::Detail(id);
    state.search_active = false;
    DispatchResult::changed_with_many(show_detail(state, id))
}

/// Point the detail resource at `id`, from the details map when possible.
fn show_detail(state: &mut AppState, id: u32) -> Vec<Effect> {
    state.evolution_selected_index = 0;
    if let Some(details) = state.details.get(&id).cloned() {
        state.detail = DataResource::Loaded(details);
        sync_evolution_selection(state);
        return request_sprites(state);
    }
    state.detail = DataResource::Loading;
    vec![Effect::LoadDetail { id }]
}

/// Start loading every image of the current detail page not seen before.
fn request_sprites(state: &mut AppState) -> Vec<Effect> {
    let mut effects = Vec::new();
    for url in state.detail_sprite_urls() {
        if state.sprites.contains_key(&url) {
            continue;
        }
        state.sprites.insert(url.clone(), DataResource::Loading);
        effects.push(Effect::LoadSprite { url });
    }
    effects
}

fn sync_evolution_selection(state: &mut AppState) {
    let current = state.detail_id();
    state.evolution_selected_index = state
        .current_details()
        .and_then(|details| {
            details
                .evolution_chain
                .iter()
                .position(|node| Some(node.id) == current)
        })
        .unwrap_or(0);
}

fn cycle_type(state: &mut AppState, step: i16) -> DispatchResult<Effect> {
    let filters = FilterState {
        type_filter: cycle_option(&TYPE_OPTIONS, &state.filters.type_filter, step),
        ..state.filters.clone()
    };
    changed_if(state.set_filters(filters))
}

fn cycle_generation(state: &mut AppState, step: i16) -> DispatchResult<Effect> {
    let filters = FilterState {
        generation_filter: cycle_option(&GENERATION_OPTIONS, &state.filters.generation_filter, step),
        ..state.filters.clone()
    };
    changed_if(state.set_filters(filters))
}

fn list_page_size(state: &AppState) -> usize {
    state.terminal_size.1.saturating_sub(8).max(1) as usize
}
