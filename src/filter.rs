//! Conjunctive list filtering over type, generation and name search.

use crate::generations::has_visible_generation;
use crate::model::EnrichedSummaryRecord;
use crate::state::FilterState;

pub const TYPE_OPTIONS: [&str; 19] = [
    "fire", "water", "grass", "normal", "fighting", "flying", "rock", "steel", "ground", "bug",
    "poison", "electric", "ghost", "psychic", "ice", "dragon", "dark", "fairy", "unknown",
];

pub const GENERATION_OPTIONS: [&str; 8] = [
    "generation-i",
    "generation-ii",
    "generation-iii",
    "generation-iv",
    "generation-v",
    "generation-vi",
    "generation-vii",
    "generation-viii",
];

/// Empty criteria always pass. Search is a case-insensitive substring match on the name.
pub fn matches(record: &EnrichedSummaryRecord, filters: &FilterState) -> bool {
    let matches_type = filters.type_filter.is_empty()
        || record.types.iter().any(|name| *name == filters.type_filter);
    let matches_generation = filters.generation_filter.is_empty()
        || has_visible_generation(&record.generations, &filters.generation_filter);
    let matches_search = filters.search.is_empty()
        || record
            .name
            .to_lowercase()
            .contains(&filters.search.to_lowercase());
    matches_type && matches_generation && matches_search
}

pub fn filter_records<'a>(
    records: &'a [EnrichedSummaryRecord],
    filters: &FilterState,
) -> Vec<&'a EnrichedSummaryRecord> {
    records
        .iter()
        .filter(|record| matches(record, filters))
        .collect()
}

/// Step through `options` with an empty slot ("all") before the first entry,
/// wrapping at both ends. An unknown `current` counts as the empty slot.
pub fn cycle_option(options: &[&str], current: &str, step: i16) -> String {
    let slots = options.len() as i16 + 1;
    let current_index = options
        .iter()
        .position(|option| *option == current)
        .map(|idx| idx as i16 + 1)
        .unwrap_or(0);
    let next = (current_index + step).rem_euclid(slots);
    if next == 0 {
        String::new()
    } else {
        options[(next - 1) as usize].to_string()
    }
}
