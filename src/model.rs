//! Records produced by the aggregators and consumed by the views.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Sprite slot label to image URL. `None` marks a slot the upstream left empty.
pub type SpriteSet = BTreeMap<String, Option<String>>;

/// Generation label (`generation-i`) to game variant (`red-blue`) to sprites.
pub type Generations = BTreeMap<String, BTreeMap<String, SpriteSet>>;

/// Minimal listing entry from the index endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SummaryRecord {
    /// Id parsed from `reference_url`, if it has one. Only a hint: enrichment
    /// always takes the id from the detail payload.
    pub id: Option<u32>,
    pub name: String,
    pub reference_url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EnrichedSummaryRecord {
    pub id: u32,
    pub name: String,
    pub reference_url: String,
    pub types: Vec<String>,
    pub generations: Generations,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Stat {
    pub name: String,
    pub base_value: u16,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetailRecord {
    pub id: u32,
    pub name: String,
    pub types: Vec<String>,
    pub stats: Vec<Stat>,
    pub primary_sprite_url: Option<String>,
    pub species_url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EvolutionNode {
    pub id: u32,
    pub name: String,
    pub image_url: String,
}

/// Everything the detail page shows for one creature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PokemonDetails {
    pub record: DetailRecord,
    pub generations: Generations,
    pub evolution_chain: Vec<EvolutionNode>,
}

/// An index entry the best-effort fan-out had to skip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FetchFailure {
    pub name: String,
    pub reference_url: String,
    pub error: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EnrichedList {
    pub records: Vec<EnrichedSummaryRecord>,
    pub failures: Vec<FetchFailure>,
}
