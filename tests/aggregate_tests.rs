//! Aggregator and query-cache tests against an in-memory upstream.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pokedex::aggregate::{fetch_details, fetch_enriched_list, fetch_index};
use pokedex::client::Upstream;
use pokedex::config::{BranchPolicy, FanoutPolicy, FetchConfig};
use pokedex::error::ApiError;
use pokedex::query::Queries;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const BASE: &str = "http://fixture/api/v2";
const IMAGES: &str = "http://images";

#[derive(Default)]
struct Fixture {
    responses: HashMap<String, Value>,
    delays: HashMap<String, u64>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl Fixture {
    fn with(mut self, url: impl AsRef<str>, body: Value) -> Self {
        self.responses.insert(normalize(url.as_ref()), body);
        self
    }

    fn delayed(mut self, url: impl AsRef<str>, millis: u64) -> Self {
        self.delays.insert(normalize(url.as_ref()), millis);
        self
    }

    fn calls_to(&self, url: &str) -> usize {
        let url = normalize(url);
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == url)
            .count()
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

fn normalize(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[async_trait]
impl Upstream for Fixture {
    fn base_url(&self) -> &str {
        BASE
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let url = normalize(url);
        self.calls.lock().unwrap().push(url.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(millis) = self.delays.get(&url) {
            tokio::time::sleep(Duration::from_millis(*millis)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match self.responses.get(&url) {
            Some(body) => Ok(serde_json::to_vec(body).unwrap()),
            None => Err(ApiError::NotFound(url)),
        }
    }
}

fn config() -> FetchConfig {
    FetchConfig {
        base_url: BASE.to_string(),
        image_base: IMAGES.to_string(),
        list_limit: 3,
        concurrency: 2,
        ..Default::default()
    }
}

fn item_url(key: &str) -> String {
    format!("{BASE}/pokemon/{key}/")
}

fn species_url(key: &str) -> String {
    format!("{BASE}/pokemon-species/{key}/")
}

fn index(entries: &[(&str, &str)]) -> Value {
    json!({
        "count": entries.len(),
        "results": entries
            .iter()
            .map(|(name, key)| json!({ "name": name, "url": item_url(key) }))
            .collect::<Vec<_>>(),
    })
}

fn pokemon(id: u32, name: &str, types: &[&str]) -> Value {
    json!({
        "id": id,
        "name": name,
        "types": types
            .iter()
            .enumerate()
            .map(|(slot, t)| json!({ "slot": slot + 1, "type": { "name": t, "url": format!("{BASE}/type/{t}/") } }))
            .collect::<Vec<_>>(),
        "stats": [
            { "base_stat": 39, "effort": 0, "stat": { "name": "hp", "url": format!("{BASE}/stat/1/") } }
        ],
        "sprites": {
            "front_default": format!("{IMAGES}/{id}.png"),
            "versions": {
                "generation-i": {
                    "red-blue": { "front_default": format!("{IMAGES}/rb/{id}.png"), "back_default": null }
                },
                "generation-ii": {
                    "crystal": { "front_default": null }
                }
            }
        },
        "species": { "name": name, "url": species_url(&id.to_string()) },
    })
}

fn species(id: u32, chain: Option<u32>) -> Value {
    match chain {
        Some(chain) => json!({
            "id": id,
            "evolution_chain": { "url": format!("{BASE}/evolution-chain/{chain}/") }
        }),
        None => json!({ "id": id, "evolution_chain": null }),
    }
}

fn link(name: &str, key: &str, evolves_to: Vec<Value>) -> Value {
    json!({
        "species": { "name": name, "url": species_url(key) },
        "evolves_to": evolves_to,
    })
}

fn list_fixture() -> Fixture {
    Fixture::default()
        .with(
            format!("{BASE}/pokemon?limit=3"),
            index(&[("charmander", "4"), ("bulbasaur", "1"), ("ivysaur", "2")]),
        )
        .with(item_url("4"), pokemon(4, "charmander", &["fire"]))
        .with(item_url("1"), pokemon(1, "bulbasaur", &["grass", "poison"]))
        .with(item_url("2"), pokemon(2, "ivysaur", &["grass", "poison"]))
}

/// `count` entries whose detail fetches each take `millis`.
fn slow_list_fixture(count: u32, millis: u64) -> Fixture {
    let names: Vec<String> = (1..=count).map(|id| format!("mon-{id}")).collect();
    let keys: Vec<String> = (1..=count).map(|id| id.to_string()).collect();
    let entries: Vec<(&str, &str)> = names
        .iter()
        .zip(&keys)
        .map(|(name, key)| (name.as_str(), key.as_str()))
        .collect();
    let mut fixture =
        Fixture::default().with(format!("{BASE}/pokemon?limit={count}"), index(&entries));
    for (id, name) in (1..=count).zip(&names) {
        fixture = fixture
            .with(item_url(&id.to_string()), pokemon(id, name, &["normal"]))
            .delayed(item_url(&id.to_string()), millis);
    }
    fixture
}

fn charmander_fixture() -> Fixture {
    Fixture::default()
        .with(format!("{BASE}/pokemon/4"), pokemon(4, "charmander", &["fire"]))
        .with(species_url("4"), species(4, Some(2)))
        .with(
            format!("{BASE}/evolution-chain/2/"),
            json!({
                "id": 2,
                "chain": link("charmander", "4", vec![
                    link("charmeleon", "5", vec![link("charizard", "6", vec![])])
                ])
            }),
        )
}

// ============================================================================
// List aggregator
// ============================================================================

#[tokio::test]
async fn index_entries_carry_ids_from_their_urls() {
    let fixture = Fixture::default().with(
        format!("{BASE}/pokemon?limit=3"),
        index(&[("charmander", "4"), ("bulbasaur", "bulbasaur")]),
    );
    let summaries = fetch_index(&fixture, 3).await.unwrap();

    let ids: Vec<Option<u32>> = summaries.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![Some(4), None]);
    assert_eq!(summaries[1].reference_url, item_url("bulbasaur"));
}

#[tokio::test]
async fn list_keeps_index_order_despite_completion_order() {
    let fixture = list_fixture().delayed(item_url("4"), 40);
    let list = fetch_enriched_list(Arc::new(fixture), &config()).await.unwrap();

    let ids: Vec<u32> = list.records.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![4, 1, 2]);
    assert_eq!(list.records[1].types, vec!["grass", "poison"]);
    assert!(list.failures.is_empty());
}

#[tokio::test]
async fn list_ids_come_from_the_detail_payload() {
    let fixture = Fixture::default()
        .with(
            format!("{BASE}/pokemon?limit=3"),
            index(&[("bulbasaur", "bulbasaur")]),
        )
        .with(item_url("bulbasaur"), pokemon(1, "bulbasaur", &["grass"]));

    let list = fetch_enriched_list(Arc::new(fixture), &config()).await.unwrap();
    assert_eq!(list.records[0].id, 1);
    assert!(list.records[0].generations.contains_key("generation-i"));
}

#[tokio::test]
async fn best_effort_skips_failed_items() {
    let mut fixture = list_fixture();
    fixture.responses.remove(&normalize(&item_url("1")));

    let list = fetch_enriched_list(Arc::new(fixture), &config()).await.unwrap();
    let names: Vec<&str> = list.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["charmander", "ivysaur"]);
    assert_eq!(list.failures.len(), 1);
    assert_eq!(list.failures[0].name, "bulbasaur");
}

#[tokio::test]
async fn best_effort_fails_when_every_item_fails() {
    let fixture = Fixture::default().with(
        format!("{BASE}/pokemon?limit=3"),
        index(&[("a", "900"), ("b", "901")]),
    );
    let err = fetch_enriched_list(Arc::new(fixture), &config())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Upstream(_)));
}

#[tokio::test]
async fn fail_fast_fails_the_batch() {
    let mut fixture = list_fixture();
    fixture.responses.remove(&normalize(&item_url("2")));
    let config = FetchConfig {
        fanout: FanoutPolicy::FailFast,
        ..config()
    };

    let err = fetch_enriched_list(Arc::new(fixture), &config)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("ivysaur"));
}

#[tokio::test]
async fn empty_index_is_an_empty_list() {
    let fixture = Fixture::default().with(format!("{BASE}/pokemon?limit=3"), index(&[]));
    let list = fetch_enriched_list(Arc::new(fixture), &config()).await.unwrap();
    assert!(list.records.is_empty());
    assert!(list.failures.is_empty());
}

#[tokio::test]
async fn index_failure_is_an_upstream_error() {
    let err = fetch_enriched_list(Arc::new(Fixture::default()), &config())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Upstream(_)), "{err:?}");
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn fanout_never_exceeds_the_worker_pool() {
    let fixture = Arc::new(slow_list_fixture(40, 5));
    let config = FetchConfig {
        list_limit: 40,
        concurrency: 5,
        ..config()
    };

    let list = fetch_enriched_list(fixture.clone(), &config).await.unwrap();
    assert_eq!(list.records.len(), 40);
    assert!(fixture.peak_in_flight() <= 5, "peak {}", fixture.peak_in_flight());
    assert!(fixture.peak_in_flight() > 1);
}

#[tokio::test]
async fn zero_concurrency_still_completes_one_at_a_time() {
    let fixture = Arc::new(slow_list_fixture(6, 2));
    let config = FetchConfig {
        list_limit: 6,
        concurrency: 0,
        ..config()
    };

    let list = fetch_enriched_list(fixture.clone(), &config).await.unwrap();
    let ids: Vec<u32> = list.records.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(fixture.peak_in_flight(), 1);
}

// ============================================================================
// Detail aggregator
// ============================================================================

#[tokio::test]
async fn details_walk_a_linear_chain() {
    let fixture = charmander_fixture();
    let details = fetch_details(&fixture, 4, &config()).await.unwrap();

    assert_eq!(details.record.name, "charmander");
    assert_eq!(details.record.types, vec!["fire"]);
    assert_eq!(details.record.stats[0].base_value, 39);
    assert_eq!(
        details.record.primary_sprite_url.as_deref(),
        Some("http://images/4.png")
    );
    let chain: Vec<(u32, &str, &str)> = details
        .evolution_chain
        .iter()
        .map(|node| (node.id, node.name.as_str(), node.image_url.as_str()))
        .collect();
    assert_eq!(
        chain,
        vec![
            (4, "charmander", "http://images/4.png"),
            (5, "charmeleon", "http://images/5.png"),
            (6, "charizard", "http://images/6.png"),
        ]
    );
    // detail, species, chain: node ids come from the chain's species URLs
    assert_eq!(fixture.total_calls(), 3);
}

#[tokio::test]
async fn single_stage_chain_is_empty() {
    let fixture = Fixture::default()
        .with(format!("{BASE}/pokemon/128"), pokemon(128, "tauros", &["normal"]))
        .with(species_url("128"), species(128, Some(60)))
        .with(
            format!("{BASE}/evolution-chain/60/"),
            json!({ "id": 60, "chain": link("tauros", "128", vec![]) }),
        );

    let details = fetch_details(&fixture, 128, &config()).await.unwrap();
    assert!(details.evolution_chain.is_empty());
}

#[tokio::test]
async fn species_without_chain_reference_is_empty() {
    let fixture = Fixture::default()
        .with(format!("{BASE}/pokemon/132"), pokemon(132, "ditto", &["normal"]))
        .with(species_url("132"), species(132, None));

    let details = fetch_details(&fixture, 132, &config()).await.unwrap();
    assert!(details.evolution_chain.is_empty());
}

#[tokio::test]
async fn missing_detail_is_not_found() {
    let err = fetch_details(&Fixture::default(), 99999, &config())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn id_zero_is_rejected_without_a_request() {
    let fixture = Fixture::default();
    let err = fetch_details(&fixture, 0, &config()).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(fixture.total_calls(), 0);
}

#[tokio::test]
async fn branch_policy_controls_split_chains() {
    let fixture = Fixture::default()
        .with(format!("{BASE}/pokemon/133"), pokemon(133, "eevee", &["normal"]))
        .with(species_url("133"), species(133, Some(67)))
        .with(
            format!("{BASE}/evolution-chain/67/"),
            json!({
                "id": 67,
                "chain": link("eevee", "133", vec![
                    link("vaporeon", "134", vec![]),
                    link("jolteon", "135", vec![]),
                    link("flareon", "136", vec![]),
                ])
            }),
        );

    let first = fetch_details(&fixture, 133, &config()).await.unwrap();
    let ids: Vec<u32> = first.evolution_chain.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![133, 134]);

    let config = FetchConfig {
        branches: BranchPolicy::All,
        ..config()
    };
    let all = fetch_details(&fixture, 133, &config).await.unwrap();
    let ids: Vec<u32> = all.evolution_chain.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![133, 134, 135, 136]);
}

#[tokio::test]
async fn unparseable_species_url_falls_back_to_species_fetch() {
    let fixture = Fixture::default()
        .with(format!("{BASE}/pokemon/1"), pokemon(1, "bulbasaur", &["grass"]))
        .with(species_url("1"), species(1, Some(1)))
        .with(species_url("ivysaur"), species(2, Some(1)))
        .with(
            format!("{BASE}/evolution-chain/1/"),
            json!({
                "id": 1,
                "chain": link("bulbasaur", "1", vec![link("ivysaur", "ivysaur", vec![])])
            }),
        );

    let details = fetch_details(&fixture, 1, &config()).await.unwrap();
    let ids: Vec<u32> = details.evolution_chain.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(fixture.calls_to(&species_url("ivysaur")), 1);
}

// ============================================================================
// Query cache
// ============================================================================

#[tokio::test]
async fn concurrent_detail_queries_share_one_fetch() {
    let fixture = Arc::new(charmander_fixture().delayed(format!("{BASE}/pokemon/4"), 30));
    let queries = Queries::new(fixture.clone(), config());

    let (a, b) = tokio::join!(queries.pokemon_details(4), queries.pokemon_details(4));
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(fixture.calls_to(&format!("{BASE}/pokemon/4")), 1);

    queries.pokemon_details(4).await.unwrap();
    assert_eq!(fixture.calls_to(&format!("{BASE}/pokemon/4")), 1);
}

#[tokio::test]
async fn abandoned_detail_query_still_completes() {
    let detail_url = format!("{BASE}/pokemon/4");
    let chain_url = format!("{BASE}/evolution-chain/2/");
    let fixture = Arc::new(charmander_fixture().delayed(&detail_url, 50));
    let queries = Arc::new(Queries::new(fixture.clone(), config()));

    let pending = tokio::spawn({
        let queries = Arc::clone(&queries);
        async move { queries.pokemon_details(4).await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    pending.abort();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(fixture.calls_to(&chain_url), 1);

    let details = queries.pokemon_details(4).await.unwrap();
    assert_eq!(details.record.name, "charmander");
    assert_eq!(details.evolution_chain.len(), 3);
    assert_eq!(fixture.calls_to(&detail_url), 1);
}

#[tokio::test]
async fn list_refresh_refetches_after_invalidation() {
    let fixture = Arc::new(list_fixture());
    let queries = Queries::new(fixture.clone(), config());
    let index_url = format!("{BASE}/pokemon?limit=3");

    queries.pokemon_list().await.unwrap();
    queries.pokemon_list().await.unwrap();
    assert_eq!(fixture.calls_to(&index_url), 1);

    queries.invalidate_list();
    queries.pokemon_list().await.unwrap();
    assert_eq!(fixture.calls_to(&index_url), 2);
}
