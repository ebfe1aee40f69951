//! Keyed memoization for aggregator results.
//!
//! A completed value stays cached until invalidated. Callers asking for a key
//! that is already being fetched share the in-flight future, so one upstream
//! round-trip serves all of them. Failures are never cached.
//!
//! Each load runs on its own task and settles its slot itself, so a caller
//! that stops waiting (a cancelled effect task) never strands the entry.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};

use crate::aggregate::{fetch_details, fetch_enriched_list};
use crate::client::Upstream;
use crate::config::FetchConfig;
use crate::error::ApiError;
use crate::model::{EnrichedList, PokemonDetails};
use crate::sprite::{decode_sprite, Sprite};

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, ApiError>>>;
type Entries<K, V> = Arc<Mutex<HashMap<K, Entry<V>>>>;

enum Entry<V: Clone> {
    Ready(V),
    InFlight { generation: u64, fetch: SharedFetch<V> },
}

pub struct QueryCache<K, V: Clone> {
    entries: Entries<K, V>,
    generation: AtomicU64,
}

impl<K, V> Default for QueryCache<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }

    /// Must be called from within a tokio runtime: a miss spawns the load.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, load: F) -> Result<V, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let fetch = {
            let mut entries = lock(&self.entries);
            match entries.get(&key) {
                Some(Entry::Ready(value)) => return Ok(value.clone()),
                Some(Entry::InFlight { fetch, .. }) => fetch.clone(),
                None => {
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                    let fetch = self.spawn_load(key.clone(), generation, load());
                    entries.insert(
                        key,
                        Entry::InFlight {
                            generation,
                            fetch: fetch.clone(),
                        },
                    );
                    fetch
                }
            }
        };
        fetch.await
    }

    fn spawn_load<Fut>(&self, key: K, generation: u64, load: Fut) -> SharedFetch<V>
    where
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let entries = Arc::clone(&self.entries);
        let task = tokio::spawn({
            let entries = Arc::clone(&entries);
            let key = key.clone();
            async move {
                let result = load.await;
                settle(&entries, key, generation, &result);
                result
            }
        });
        async move {
            match task.await {
                Ok(result) => result,
                Err(err) => {
                    let result = Err(ApiError::Upstream(format!("query task failed: {err}")));
                    settle(&entries, key, generation, &result);
                    result
                }
            }
        }
        .boxed()
        .shared()
    }

    pub fn invalidate(&self, key: &K) {
        lock(&self.entries).remove(key);
    }

    pub fn is_cached(&self, key: &K) -> bool {
        matches!(lock(&self.entries).get(key), Some(Entry::Ready(_)))
    }
}

fn lock<K, V: Clone>(entries: &Entries<K, V>) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Store the outcome of load `generation`. An invalidation in between leaves
/// the newer entry alone.
fn settle<K, V>(entries: &Entries<K, V>, key: K, generation: u64, result: &Result<V, ApiError>)
where
    K: Eq + Hash,
    V: Clone,
{
    let mut entries = lock(entries);
    let owns_slot = matches!(
        entries.get(&key),
        Some(Entry::InFlight { generation: current, .. }) if *current == generation
    );
    if !owns_slot {
        return;
    }
    match result {
        Ok(value) => {
            entries.insert(key, Entry::Ready(value.clone()));
        }
        Err(_) => {
            entries.remove(&key);
        }
    }
}

/// The queries the app issues: the enriched list, per-id details and images.
pub struct Queries {
    upstream: Arc<dyn Upstream>,
    config: FetchConfig,
    list: QueryCache<(), EnrichedList>,
    details: QueryCache<u32, PokemonDetails>,
    sprites: QueryCache<String, Sprite>,
}

impl Queries {
    pub fn new(upstream: Arc<dyn Upstream>, config: FetchConfig) -> Self {
        Self {
            upstream,
            config,
            list: QueryCache::new(),
            details: QueryCache::new(),
            sprites: QueryCache::new(),
        }
    }

    pub async fn pokemon_list(&self) -> Result<EnrichedList, ApiError> {
        let upstream = Arc::clone(&self.upstream);
        let config = self.config.clone();
        self.list
            .get_or_fetch((), move || async move {
                fetch_enriched_list(upstream, &config).await
            })
            .await
    }

    pub async fn pokemon_details(&self, id: u32) -> Result<PokemonDetails, ApiError> {
        let upstream = Arc::clone(&self.upstream);
        let config = self.config.clone();
        self.details
            .get_or_fetch(id, move || async move {
                fetch_details(upstream.as_ref(), id, &config).await
            })
            .await
    }

    pub async fn sprite(&self, url: &str) -> Result<Sprite, ApiError> {
        let upstream = Arc::clone(&self.upstream);
        let target = url.to_string();
        self.sprites
            .get_or_fetch(target.clone(), move || async move {
                let bytes = upstream.get_bytes(&target).await?;
                decode_sprite(&bytes).map_err(|err| {
                    ApiError::Upstream(format!("{target}: image decode error: {err}"))
                })
            })
            .await
    }

    pub fn invalidate_list(&self) {
        self.list.invalidate(&());
    }
}
