//! Generation map reshaping shared by the list and detail aggregators.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::model::{Generations, SpriteSet};

/// Reshape an upstream `sprites` object into a generation map.
///
/// Reads `sprites.versions`; nested slot objects (`animated`, `icons`) are
/// flattened into `parent/child` labels so every leaf is a nullable URL.
pub fn generations_from_sprites(sprites: &Value) -> Generations {
    let Some(versions) = sprites.get("versions").and_then(Value::as_object) else {
        return Generations::new();
    };
    versions
        .iter()
        .map(|(generation, games)| {
            let variants = games
                .as_object()
                .map(|games| {
                    games
                        .iter()
                        .map(|(game, slots)| (game.clone(), sprite_set(slots)))
                        .collect()
                })
                .unwrap_or_default();
            (generation.clone(), variants)
        })
        .collect()
}

fn sprite_set(slots: &Value) -> SpriteSet {
    let mut set = SpriteSet::new();
    flatten_slots("", slots, &mut set);
    set
}

fn flatten_slots(prefix: &str, value: &Value, set: &mut SpriteSet) {
    let Some(slots) = value.as_object() else {
        return;
    };
    for (slot, entry) in slots {
        let label = if prefix.is_empty() {
            slot.clone()
        } else {
            format!("{prefix}/{slot}")
        };
        match entry {
            Value::Object(_) => flatten_slots(&label, entry, set),
            Value::String(url) => {
                set.insert(label, Some(url.clone()));
            }
            _ => {
                set.insert(label, None);
            }
        }
    }
}

pub fn variants_visible(variants: &BTreeMap<String, SpriteSet>) -> bool {
    variants
        .values()
        .any(|set| set.values().any(|slot| slot.is_some()))
}

/// Only the generations with at least one non-null sprite.
pub fn visible_generations(generations: &Generations) -> Generations {
    generations
        .iter()
        .filter(|(_, variants)| variants_visible(variants))
        .map(|(generation, variants)| (generation.clone(), variants.clone()))
        .collect()
}

pub fn has_visible_generation(generations: &Generations, generation: &str) -> bool {
    generations
        .get(generation)
        .map(variants_visible)
        .unwrap_or(false)
}

/// `generation-iv` → `Generation IV`.
pub fn generation_label(generation: &str) -> String {
    match generation.strip_prefix("generation-") {
        Some(numeral) => format!("Generation {}", numeral.to_ascii_uppercase()),
        None => generation.to_string(),
    }
}
