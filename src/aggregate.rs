//! List and detail aggregation over the upstream API.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::client::{fetch_json, id_from_url, image_url, Upstream};
use crate::config::{BranchPolicy, FanoutPolicy, FetchConfig};
use crate::error::ApiError;
use crate::generations::generations_from_sprites;
use crate::model::{
    DetailRecord, EnrichedList, EnrichedSummaryRecord, EvolutionNode, FetchFailure,
    PokemonDetails, Stat, SummaryRecord,
};

#[derive(Clone, Debug, Deserialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, Deserialize)]
struct ApiResource {
    url: String,
}

#[derive(Clone, Debug, Deserialize)]
struct ListResponse {
    results: Vec<NamedResource>,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonResponse {
    id: u32,
    name: String,
    types: Vec<PokemonTypeSlot>,
    #[serde(default)]
    stats: Vec<PokemonStatSlot>,
    sprites: serde_json::Value,
    species: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonTypeSlot {
    #[serde(rename = "type")]
    type_info: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonStatSlot {
    base_stat: u16,
    stat: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonSpeciesResponse {
    id: u32,
    #[serde(default)]
    evolution_chain: Option<ApiResource>,
}

#[derive(Clone, Debug, Deserialize)]
struct EvolutionChainResponse {
    chain: ChainLink,
}

/// One node of an upstream evolution-chain graph.
#[derive(Clone, Debug, Deserialize)]
pub struct ChainLink {
    pub species: NamedResource,
    #[serde(default)]
    pub evolves_to: Vec<ChainLink>,
}

pub async fn fetch_index(
    upstream: &dyn Upstream,
    limit: u32,
) -> Result<Vec<SummaryRecord>, ApiError> {
    let response: ListResponse = fetch_json(upstream, &format!("/pokemon?limit={limit}")).await?;
    Ok(response
        .results
        .into_iter()
        .map(|entry| SummaryRecord {
            id: id_from_url(&entry.url),
            name: entry.name,
            reference_url: entry.url,
        })
        .collect())
}

/// Fetch the index, then enrich every entry from its own detail payload.
///
/// Detail fetches run through a worker pool of `config.concurrency` permits.
/// The output keeps index order. Item failures follow `config.fanout`.
pub async fn fetch_enriched_list(
    upstream: Arc<dyn Upstream>,
    config: &FetchConfig,
) -> Result<EnrichedList, ApiError> {
    let summaries = fetch_index(upstream.as_ref(), config.list_limit)
        .await
        .map_err(|err| ApiError::Upstream(format!("index fetch failed: {err}")))?;
    if summaries.is_empty() {
        return Ok(EnrichedList::default());
    }

    let semaphore = Arc::new(Semaphore::new(config.worker_permits()));
    let mut join_set = JoinSet::new();
    for (index, summary) in summaries.iter().cloned().enumerate() {
        let upstream = Arc::clone(&upstream);
        let semaphore = Arc::clone(&semaphore);
        join_set.spawn(async move {
            let result = enrich_with_permit(upstream, semaphore, &summary).await;
            (index, result)
        });
    }

    let mut records: Vec<Option<EnrichedSummaryRecord>> = vec![None; summaries.len()];
    let mut failures: Vec<Option<String>> = vec![None; summaries.len()];
    while let Some(joined) = join_set.join_next().await {
        let (index, result) = match joined {
            Ok(done) => done,
            Err(err) => {
                tracing::warn!(error = %err, "enrichment task did not complete");
                if config.fanout == FanoutPolicy::FailFast {
                    join_set.abort_all();
                    return Err(ApiError::Upstream(format!("enrichment task failed: {err}")));
                }
                continue;
            }
        };
        match result {
            Ok(record) => records[index] = Some(record),
            Err(err) => {
                let summary = &summaries[index];
                if config.fanout == FanoutPolicy::FailFast {
                    join_set.abort_all();
                    return Err(ApiError::Upstream(format!(
                        "failed to enrich {}: {err}",
                        summary.name
                    )));
                }
                tracing::warn!(
                    name = %summary.name,
                    index_id = ?summary.id,
                    error = %err,
                    "skipping list entry"
                );
                failures[index] = Some(err.to_string());
            }
        }
    }

    let mut list = EnrichedList::default();
    for ((summary, record), failure) in summaries.into_iter().zip(records).zip(failures) {
        match record {
            Some(record) => list.records.push(record),
            None => list.failures.push(FetchFailure {
                name: summary.name,
                reference_url: summary.reference_url,
                error: failure.unwrap_or_else(|| "enrichment task did not complete".to_string()),
            }),
        }
    }

    if list.records.is_empty() {
        return Err(ApiError::Upstream(format!(
            "failed to enrich all {} index entries",
            list.failures.len()
        )));
    }
    tracing::info!(
        loaded = list.records.len(),
        skipped = list.failures.len(),
        "enriched list ready"
    );
    Ok(list)
}

async fn enrich_with_permit(
    upstream: Arc<dyn Upstream>,
    semaphore: Arc<Semaphore>,
    summary: &SummaryRecord,
) -> Result<EnrichedSummaryRecord, ApiError> {
    let _permit = semaphore
        .acquire_owned()
        .await
        .map_err(|_| ApiError::Upstream("enrichment worker pool closed".to_string()))?;
    enrich(upstream.as_ref(), summary).await
}

async fn enrich(
    upstream: &dyn Upstream,
    summary: &SummaryRecord,
) -> Result<EnrichedSummaryRecord, ApiError> {
    let response: PokemonResponse = fetch_json(upstream, &summary.reference_url).await?;
    Ok(EnrichedSummaryRecord {
        id: response.id,
        name: summary.name.clone(),
        reference_url: summary.reference_url.clone(),
        types: type_names(&response.types),
        generations: generations_from_sprites(&response.sprites),
    })
}

/// Detail, species and evolution chain for one creature.
pub async fn fetch_details(
    upstream: &dyn Upstream,
    id: u32,
    config: &FetchConfig,
) -> Result<PokemonDetails, ApiError> {
    if id == 0 {
        return Err(ApiError::NotFound("pokemon/0".to_string()));
    }
    let response: PokemonResponse = fetch_json(upstream, &format!("/pokemon/{id}")).await?;
    let generations = generations_from_sprites(&response.sprites);
    let record = detail_record(response);

    let species: PokemonSpeciesResponse = fetch_json(upstream, &record.species_url).await?;
    let evolution_chain = match species.evolution_chain {
        Some(chain) => {
            let chain: EvolutionChainResponse = fetch_json(upstream, &chain.url).await?;
            resolve_chain(upstream, &chain.chain, config).await?
        }
        None => Vec::new(),
    };
    tracing::debug!(id, stages = evolution_chain.len(), "details ready");

    Ok(PokemonDetails {
        record,
        generations,
        evolution_chain,
    })
}

fn detail_record(response: PokemonResponse) -> DetailRecord {
    let primary_sprite_url = response
        .sprites
        .get("front_default")
        .and_then(|value| value.as_str())
        .map(|s| s.to_string());
    DetailRecord {
        id: response.id,
        name: response.name,
        types: type_names(&response.types),
        stats: response
            .stats
            .into_iter()
            .map(|slot| Stat {
                name: slot.stat.name,
                base_value: slot.base_stat,
            })
            .collect(),
        primary_sprite_url,
        species_url: response.species.url,
    }
}

fn type_names(slots: &[PokemonTypeSlot]) -> Vec<String> {
    slots.iter().map(|slot| slot.type_info.name.clone()).collect()
}

/// Nodes visited by the evolution walk, in emission order.
///
/// A root without successors means no recorded evolutions and yields nothing.
pub fn walk_chain(root: &ChainLink, branches: BranchPolicy) -> Vec<&ChainLink> {
    if root.evolves_to.is_empty() {
        return Vec::new();
    }
    let mut visited: Vec<&ChainLink> = Vec::new();
    match branches {
        BranchPolicy::First => {
            let mut current = Some(root);
            while let Some(link) = current {
                visited.push(link);
                current = link.evolves_to.first();
            }
        }
        BranchPolicy::All => {
            let mut stack = vec![root];
            while let Some(link) = stack.pop() {
                if !visited
                    .iter()
                    .any(|seen| seen.species.url == link.species.url)
                {
                    visited.push(link);
                }
                stack.extend(link.evolves_to.iter().rev());
            }
        }
    }
    visited
}

async fn resolve_chain(
    upstream: &dyn Upstream,
    root: &ChainLink,
    config: &FetchConfig,
) -> Result<Vec<EvolutionNode>, ApiError> {
    let mut nodes = Vec::new();
    for link in walk_chain(root, config.branches) {
        let id = match id_from_url(&link.species.url) {
            Some(id) => id,
            None => {
                let species: PokemonSpeciesResponse =
                    fetch_json(upstream, &link.species.url).await?;
                species.id
            }
        };
        nodes.push(EvolutionNode {
            id,
            name: link.species.name.clone(),
            image_url: image_url(&config.image_base, id),
        });
    }
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn link(value: serde_json::Value) -> ChainLink {
        serde_json::from_value(value).unwrap()
    }

    fn species(name: &str, id: u32) -> serde_json::Value {
        json!({ "name": name, "url": format!("https://pokeapi.co/api/v2/pokemon-species/{id}/") })
    }

    fn names(links: &[&ChainLink]) -> Vec<String> {
        links.iter().map(|link| link.species.name.clone()).collect()
    }

    #[test]
    fn single_stage_chain_is_empty() {
        let root = link(json!({ "species": species("tauros", 128), "evolves_to": [] }));
        assert!(walk_chain(&root, BranchPolicy::First).is_empty());
        assert!(walk_chain(&root, BranchPolicy::All).is_empty());
    }

    #[test]
    fn linear_chain_visits_every_stage_in_order() {
        let root = link(json!({
            "species": species("charmander", 4),
            "evolves_to": [{
                "species": species("charmeleon", 5),
                "evolves_to": [{ "species": species("charizard", 6), "evolves_to": [] }]
            }]
        }));
        let visited = walk_chain(&root, BranchPolicy::First);
        assert_eq!(names(&visited), vec!["charmander", "charmeleon", "charizard"]);
    }

    #[test]
    fn branch_policy_controls_split_evolutions() {
        let root = link(json!({
            "species": species("eevee", 133),
            "evolves_to": [
                { "species": species("vaporeon", 134), "evolves_to": [] },
                { "species": species("jolteon", 135), "evolves_to": [] },
                { "species": species("flareon", 136), "evolves_to": [] }
            ]
        }));
        assert_eq!(
            names(&walk_chain(&root, BranchPolicy::First)),
            vec!["eevee", "vaporeon"]
        );
        assert_eq!(
            names(&walk_chain(&root, BranchPolicy::All)),
            vec!["eevee", "vaporeon", "jolteon", "flareon"]
        );
    }
}
