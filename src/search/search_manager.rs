//! Search pipeline runtime coordinator.
//!
//! This manager is the bus-owned state holder for query handling, result
//! caching, fetch cycles, relevance scoring, and tab partitioning. It
//! consumes debounced query edits and tab changes, runs fetch cycles on
//! worker threads, and fans out renderable view snapshots.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::broadcast::{error::RecvError, Receiver, Sender};

use crate::backends::{CatalogEndpoint, CatalogSearchAdapter};
use crate::config::Config;
use crate::protocol::{
    ConfigMessage, Message, ResultBundle, SearchFilter, SearchMessage, SearchViewSnapshot,
};
use crate::search::result_cache::{normalize_query, ResultCache};
use crate::search::scorer::select_top_result;

/// Coordinates search state and snapshot fan-out over the event bus.
pub struct SearchManager {
    bus_consumer: Receiver<Message>,
    bus_producer: Sender<Message>,
    adapter: Arc<dyn CatalogSearchAdapter>,
    endpoint: CatalogEndpoint,
    cache: ResultCache,
    result_limit: u32,
    /// Monotonic counter identifying the newest accepted query edit.
    /// Completions carrying an older generation never touch the view.
    latest_generation: u64,
    active_query: String,
    active_filter: SearchFilter,
    current_bundle: ResultBundle,
}

impl SearchManager {
    /// Creates a manager bound to bus channels.
    pub fn new(
        bus_consumer: Receiver<Message>,
        bus_producer: Sender<Message>,
        adapter: Arc<dyn CatalogSearchAdapter>,
        config: &Config,
    ) -> Self {
        Self {
            bus_consumer,
            bus_producer,
            adapter,
            endpoint: CatalogEndpoint {
                endpoint: config.backend.endpoint.clone(),
                api_key: config.backend.api_key.clone(),
            },
            cache: ResultCache::new(
                Duration::from_secs(config.search.cache_ttl_secs),
                config.search.cache_capacity,
            ),
            result_limit: config.search.result_limit,
            latest_generation: 0,
            active_query: String::new(),
            active_filter: SearchFilter::All,
            current_bundle: ResultBundle::default(),
        }
    }

    /// Checks catalog reachability once at startup. Failure is a warning,
    /// not an error: searches degrade to empty results either way.
    pub fn ping_backend(&self) {
        if let Err(err) = self.adapter.ping(&self.endpoint) {
            warn!("Catalog ping failed: {}", err);
        }
    }

    fn set_query(&mut self, raw_query: &str) {
        let trimmed = raw_query.trim().to_string();
        // Every accepted edit supersedes whatever fetch may be in flight.
        self.latest_generation += 1;

        if trimmed.is_empty() {
            self.active_query.clear();
            self.current_bundle = ResultBundle::default();
            self.publish_view();
            return;
        }

        let key = normalize_query(&trimmed);
        if let Some(bundle) = self.cache.get(&key) {
            debug!("Search cache hit for '{}'", key);
            self.active_query = trimmed;
            self.current_bundle = bundle.clone();
            self.publish_view();
            return;
        }

        self.active_query = trimmed.clone();
        self.spawn_fetch_cycle(key, trimmed);
    }

    fn spawn_fetch_cycle(&self, key: String, query: String) {
        let generation = self.latest_generation;
        let adapter = Arc::clone(&self.adapter);
        let endpoint = self.endpoint.clone();
        let bus_producer = self.bus_producer.clone();
        let limit = self.result_limit;
        thread::spawn(move || {
            let bundle = fetch_bundle(adapter.as_ref(), &endpoint, &query, limit);
            let _ = bus_producer.send(Message::Search(SearchMessage::FetchCompleted {
                generation,
                key,
                bundle,
            }));
        });
    }

    fn fetch_completed(&mut self, generation: u64, key: String, bundle: ResultBundle) {
        // The bundle is valid for its own key even when the view has moved
        // on, so stale completions still warm the cache.
        self.cache.set(key, bundle.clone());
        if generation != self.latest_generation {
            debug!(
                "Discarding stale search completion (generation {}, latest {})",
                generation, self.latest_generation
            );
            return;
        }
        self.current_bundle = bundle;
        self.publish_view();
    }

    fn set_filter(&mut self, filter: SearchFilter) {
        if self.active_filter == filter {
            return;
        }
        self.active_filter = filter;
        self.publish_view();
    }

    fn apply_config(&mut self, config: &Config) {
        self.endpoint = CatalogEndpoint {
            endpoint: config.backend.endpoint.clone(),
            api_key: config.backend.api_key.clone(),
        };
        self.result_limit = config.search.result_limit;
        self.cache.reconfigure(
            Duration::from_secs(config.search.cache_ttl_secs),
            config.search.cache_capacity,
        );
    }

    fn publish_view(&self) {
        let snapshot = SearchViewSnapshot {
            query: self.active_query.clone(),
            filter: self.active_filter,
            generation: self.latest_generation,
            top_result: select_top_result(&self.current_bundle, &self.active_query),
            results: self.current_bundle.partitioned(self.active_filter),
        };
        let _ = self
            .bus_producer
            .send(Message::Search(SearchMessage::ResultsUpdated(snapshot)));
    }

    /// Starts the blocking event loop.
    pub fn run(&mut self) {
        loop {
            match self.bus_consumer.blocking_recv() {
                Ok(Message::Search(SearchMessage::SetQuery(query))) => {
                    self.set_query(&query);
                }
                Ok(Message::Search(SearchMessage::SetFilter(filter))) => {
                    self.set_filter(filter);
                }
                Ok(Message::Search(SearchMessage::FetchCompleted {
                    generation,
                    key,
                    bundle,
                })) => {
                    self.fetch_completed(generation, key, bundle);
                }
                Ok(Message::Config(ConfigMessage::ConfigChanged(config))) => {
                    self.apply_config(&config);
                }
                Ok(Message::Search(SearchMessage::ResultsUpdated(_))) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        "SearchManager lagged on control bus, skipped {} message(s)",
                        skipped
                    );
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

/// Issues the three category searches concurrently and merges the results.
///
/// Each category is independently guarded: a failed request degrades to an
/// empty collection for that category, so partial results always beat no
/// results. Total latency is bounded by the slowest of the three requests.
pub fn fetch_bundle(
    adapter: &dyn CatalogSearchAdapter,
    endpoint: &CatalogEndpoint,
    query: &str,
    limit: u32,
) -> ResultBundle {
    thread::scope(|scope| {
        let songs_handle = scope.spawn(|| {
            adapter
                .search_songs(endpoint, query, limit)
                .unwrap_or_else(|err| {
                    warn!("Song search failed: {}", err);
                    Vec::new()
                })
        });
        let albums_handle = scope.spawn(|| {
            adapter
                .search_albums(endpoint, query, limit)
                .unwrap_or_else(|err| {
                    warn!("Album search failed: {}", err);
                    Vec::new()
                })
        });
        let artists_handle = scope.spawn(|| {
            adapter
                .search_artists(endpoint, query, limit)
                .unwrap_or_else(|err| {
                    warn!("Artist search failed: {}", err);
                    Vec::new()
                })
        });
        ResultBundle {
            songs: songs_handle.join().unwrap_or_default(),
            albums: albums_handle.join().unwrap_or_default(),
            artists: artists_handle.join().unwrap_or_default(),
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::sync::broadcast;

    use super::{fetch_bundle, SearchManager};
    use crate::backends::{CatalogEndpoint, CatalogSearchAdapter};
    use crate::config::Config;
    use crate::protocol::{
        AlbumCandidate, ArtistCandidate, ArtistRef, Message, ResultBundle, SearchCategory,
        SearchFilter, SearchMessage, SearchViewSnapshot, SongCandidate,
    };

    #[derive(Default)]
    struct MockCatalog {
        song_calls: AtomicUsize,
        album_calls: AtomicUsize,
        artist_calls: AtomicUsize,
        fail_albums: bool,
    }

    impl CatalogSearchAdapter for MockCatalog {
        fn ping(&self, _endpoint: &CatalogEndpoint) -> Result<(), String> {
            Ok(())
        }

        fn search_songs(
            &self,
            _endpoint: &CatalogEndpoint,
            _query: &str,
            _limit: u32,
        ) -> Result<Vec<SongCandidate>, String> {
            self.song_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![SongCandidate {
                id: "s1".to_string(),
                title: "Hello".to_string(),
                artist: ArtistRef::Name("Adele".to_string()),
                duration_label: "4:55".to_string(),
            }])
        }

        fn search_albums(
            &self,
            _endpoint: &CatalogEndpoint,
            _query: &str,
            _limit: u32,
        ) -> Result<Vec<AlbumCandidate>, String> {
            self.album_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_albums {
                return Err("album service unavailable".to_string());
            }
            Ok(vec![AlbumCandidate {
                id: "al1".to_string(),
                title: "25".to_string(),
                artist: ArtistRef::Name("Adele".to_string()),
            }])
        }

        fn search_artists(
            &self,
            _endpoint: &CatalogEndpoint,
            _query: &str,
            _limit: u32,
        ) -> Result<Vec<ArtistCandidate>, String> {
            self.artist_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![ArtistCandidate {
                id: "ar1".to_string(),
                name: "Adele".to_string(),
            }])
        }
    }

    fn test_manager(
        adapter: Arc<MockCatalog>,
    ) -> (
        SearchManager,
        broadcast::Sender<Message>,
        broadcast::Receiver<Message>,
    ) {
        let (bus_sender, _) = broadcast::channel(64);
        let observer = bus_sender.subscribe();
        let manager = SearchManager::new(
            bus_sender.subscribe(),
            bus_sender.clone(),
            adapter,
            &Config::default(),
        );
        (manager, bus_sender, observer)
    }

    /// Waits for the next fetch completion on the bus, skipping other
    /// traffic, and returns its payload so tests can drive the manager the
    /// way the run loop would.
    fn recv_fetch_completed(
        observer: &mut broadcast::Receiver<Message>,
    ) -> (u64, String, ResultBundle) {
        loop {
            match observer
                .blocking_recv()
                .expect("bus should stay open while waiting for a fetch completion")
            {
                Message::Search(SearchMessage::FetchCompleted {
                    generation,
                    key,
                    bundle,
                }) => return (generation, key, bundle),
                _ => continue,
            }
        }
    }

    fn recv_results_updated(observer: &mut broadcast::Receiver<Message>) -> SearchViewSnapshot {
        loop {
            match observer
                .blocking_recv()
                .expect("bus should stay open while waiting for a snapshot")
            {
                Message::Search(SearchMessage::ResultsUpdated(snapshot)) => return snapshot,
                _ => continue,
            }
        }
    }

    #[test]
    fn test_empty_query_clears_results_without_fetching() {
        let adapter = Arc::new(MockCatalog::default());
        let (mut manager, _bus_sender, mut observer) = test_manager(Arc::clone(&adapter));

        manager.set_query("   ");

        let snapshot = recv_results_updated(&mut observer);
        assert!(snapshot.query.is_empty());
        assert!(snapshot.results.is_empty());
        assert!(snapshot.top_result.is_none());
        assert_eq!(adapter.song_calls.load(Ordering::SeqCst), 0);
        assert_eq!(adapter.album_calls.load(Ordering::SeqCst), 0);
        assert_eq!(adapter.artist_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fetch_cycle_publishes_scored_snapshot() {
        let adapter = Arc::new(MockCatalog::default());
        let (mut manager, _bus_sender, mut observer) = test_manager(Arc::clone(&adapter));

        manager.set_query("Adele");
        let (generation, key, bundle) = recv_fetch_completed(&mut observer);
        assert_eq!(key, "adele");
        manager.fetch_completed(generation, key, bundle);

        let snapshot = recv_results_updated(&mut observer);
        assert_eq!(snapshot.query, "Adele");
        assert_eq!(snapshot.results.songs.len(), 1);
        assert_eq!(snapshot.results.albums.len(), 1);
        assert_eq!(snapshot.results.artists.len(), 1);
        let top = snapshot.top_result.expect("an exact artist match should win");
        assert_eq!(top.score, 300);
        assert_eq!(top.candidate.kind(), SearchCategory::Artist);
    }

    #[test]
    fn test_cache_hit_skips_fetch_for_case_insensitive_repeat() {
        let adapter = Arc::new(MockCatalog::default());
        let (mut manager, _bus_sender, mut observer) = test_manager(Arc::clone(&adapter));

        manager.set_query("Adele");
        let (generation, key, bundle) = recv_fetch_completed(&mut observer);
        manager.fetch_completed(generation, key, bundle);
        let first_snapshot = recv_results_updated(&mut observer);

        manager.set_query("  adele ");
        let second_snapshot = recv_results_updated(&mut observer);

        assert_eq!(first_snapshot.results, second_snapshot.results);
        assert_eq!(adapter.song_calls.load(Ordering::SeqCst), 1);
        assert_eq!(adapter.album_calls.load(Ordering::SeqCst), 1);
        assert_eq!(adapter.artist_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_album_failure_degrades_to_empty_category() {
        let adapter = Arc::new(MockCatalog {
            fail_albums: true,
            ..MockCatalog::default()
        });
        let (mut manager, _bus_sender, mut observer) = test_manager(Arc::clone(&adapter));

        manager.set_query("Adele");
        let (generation, key, bundle) = recv_fetch_completed(&mut observer);
        manager.fetch_completed(generation, key, bundle);

        let snapshot = recv_results_updated(&mut observer);
        assert_eq!(snapshot.results.songs.len(), 1);
        assert!(snapshot.results.albums.is_empty());
        assert_eq!(snapshot.results.artists.len(), 1);
    }

    #[test]
    fn test_stale_completion_warms_cache_but_never_touches_view() {
        let adapter = Arc::new(MockCatalog::default());
        let (mut manager, _bus_sender, mut observer) = test_manager(Arc::clone(&adapter));

        manager.set_query("Adele");
        let (stale_generation, key, bundle) = recv_fetch_completed(&mut observer);

        // The user cleared the box before the fetch resolved.
        manager.set_query("");
        let cleared = recv_results_updated(&mut observer);
        assert!(cleared.results.is_empty());

        manager.fetch_completed(stale_generation, key, bundle);
        assert!(
            matches!(observer.try_recv(), Err(broadcast::error::TryRecvError::Empty)),
            "stale completion should not publish a snapshot"
        );

        // The stale bundle still warmed the cache for its own key.
        manager.set_query("adele");
        let snapshot = recv_results_updated(&mut observer);
        assert_eq!(snapshot.results.songs.len(), 1);
        assert_eq!(adapter.song_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_filter_round_trip_reproduces_unpartitioned_bundle() {
        let adapter = Arc::new(MockCatalog::default());
        let (mut manager, _bus_sender, mut observer) = test_manager(Arc::clone(&adapter));

        manager.set_query("Adele");
        let (generation, key, bundle) = recv_fetch_completed(&mut observer);
        manager.fetch_completed(generation, key, bundle);
        let all_snapshot = recv_results_updated(&mut observer);

        manager.set_filter(SearchFilter::Songs);
        let songs_snapshot = recv_results_updated(&mut observer);
        assert_eq!(songs_snapshot.results.songs, all_snapshot.results.songs);
        assert!(songs_snapshot.results.albums.is_empty());
        assert!(songs_snapshot.results.artists.is_empty());

        manager.set_filter(SearchFilter::All);
        let back_snapshot = recv_results_updated(&mut observer);
        assert_eq!(back_snapshot.results, all_snapshot.results);

        // Tab changes never refetch.
        assert_eq!(adapter.song_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fetch_bundle_merges_all_three_categories() {
        let adapter = MockCatalog::default();
        let endpoint = CatalogEndpoint {
            endpoint: "http://localhost:4000".to_string(),
            api_key: String::new(),
        };

        let bundle = fetch_bundle(&adapter, &endpoint, "adele", 10);
        assert_eq!(bundle.songs.len(), 1);
        assert_eq!(bundle.albums.len(), 1);
        assert_eq!(bundle.artists.len(), 1);
        assert_eq!(bundle.songs[0].id, "s1");
    }
}
