//! Streaming-catalog REST adapter implementation.

use std::time::Duration;

use serde_json::Value;

use crate::backends::{CatalogEndpoint, CatalogSearchAdapter};
use crate::protocol::{AlbumCandidate, ArtistCandidate, ArtistRef, SongCandidate};

/// Streaming-catalog adapter backed by `ureq`.
pub struct StreamingApiAdapter {
    http_client: ureq::Agent,
}

impl StreamingApiAdapter {
    /// Creates a new adapter with the given transport timeouts.
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(connect_timeout)
            .timeout_read(read_timeout)
            .build();
        Self { http_client }
    }

    fn endpoint_base(endpoint: &str) -> String {
        endpoint.trim().trim_end_matches('/').to_string()
    }

    fn api_url(endpoint: &CatalogEndpoint, path: &str, query: &str, limit: u32) -> String {
        format!(
            "{}/api/{}?q={}&limit={}",
            Self::endpoint_base(&endpoint.endpoint),
            path,
            urlencoding::encode(query),
            limit
        )
    }

    fn request_json(&self, endpoint: &CatalogEndpoint, url: &str) -> Result<Value, String> {
        let mut request = self.http_client.get(url).set("Accept", "application/json");
        if !endpoint.api_key.is_empty() {
            request = request.set("Authorization", &format!("Bearer {}", endpoint.api_key));
        }
        let response = request
            .call()
            .map_err(|err| format!("Catalog request failed ({url}): {err}"))?;
        response
            .into_json()
            .map_err(|err| format!("Catalog response parse failed ({url}): {err}"))
    }

    fn array_or_single(value: Option<&Value>) -> Vec<&Value> {
        match value {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(item @ Value::Object(_)) => vec![item],
            _ => Vec::new(),
        }
    }

    fn value_to_id(value: Option<&Value>) -> Option<String> {
        match value? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    fn parse_artist_ref(value: Option<&Value>) -> ArtistRef {
        match value {
            Some(Value::String(name)) => ArtistRef::Name(name.clone()),
            Some(reference @ Value::Object(_)) => {
                let id = Self::value_to_id(reference.get("id")).unwrap_or_default();
                let name = reference
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown Artist")
                    .to_string();
                ArtistRef::Entity { id, name }
            }
            _ => ArtistRef::Name("Unknown Artist".to_string()),
        }
    }

    fn parse_song(song: &Value) -> Option<SongCandidate> {
        let id = Self::value_to_id(song.get("id"))?;
        let title = song
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("Unknown Title")
            .to_string();
        let artist = Self::parse_artist_ref(song.get("artist"));
        let duration_secs = song.get("duration").and_then(Value::as_u64).unwrap_or(0);
        Some(SongCandidate {
            id,
            title,
            artist,
            duration_label: format_duration_label(duration_secs),
        })
    }

    fn parse_album(album: &Value) -> Option<AlbumCandidate> {
        let id = Self::value_to_id(album.get("id"))?;
        let title = album
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("Unknown Album")
            .to_string();
        let artist = Self::parse_artist_ref(album.get("artist"));
        Some(AlbumCandidate { id, title, artist })
    }

    fn parse_artist(artist: &Value) -> Option<ArtistCandidate> {
        let id = Self::value_to_id(artist.get("id"))?;
        let name = artist
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("Unknown Artist")
            .to_string();
        Some(ArtistCandidate { id, name })
    }
}

/// Formats a duration in whole seconds as an `m:ss` display label.
pub fn format_duration_label(duration_secs: u64) -> String {
    format!("{}:{:02}", duration_secs / 60, duration_secs % 60)
}

impl CatalogSearchAdapter for StreamingApiAdapter {
    fn ping(&self, endpoint: &CatalogEndpoint) -> Result<(), String> {
        let url = format!("{}/api/ping", Self::endpoint_base(&endpoint.endpoint));
        let _ = self.request_json(endpoint, &url)?;
        Ok(())
    }

    fn search_songs(
        &self,
        endpoint: &CatalogEndpoint,
        query: &str,
        limit: u32,
    ) -> Result<Vec<SongCandidate>, String> {
        let url = Self::api_url(endpoint, "songs/search", query, limit);
        let payload = self.request_json(endpoint, &url)?;
        let songs = Self::array_or_single(payload.get("songs"));
        Ok(songs.into_iter().filter_map(Self::parse_song).collect())
    }

    fn search_albums(
        &self,
        endpoint: &CatalogEndpoint,
        query: &str,
        limit: u32,
    ) -> Result<Vec<AlbumCandidate>, String> {
        let url = Self::api_url(endpoint, "albums/search", query, limit);
        let payload = self.request_json(endpoint, &url)?;
        let albums = Self::array_or_single(payload.get("data"));
        Ok(albums.into_iter().filter_map(Self::parse_album).collect())
    }

    fn search_artists(
        &self,
        endpoint: &CatalogEndpoint,
        query: &str,
        limit: u32,
    ) -> Result<Vec<ArtistCandidate>, String> {
        let url = Self::api_url(endpoint, "artists/search", query, limit);
        let payload = self.request_json(endpoint, &url)?;
        // Older catalog deployments return this list under `artists`.
        let artists = match payload.get("data") {
            Some(data) => Self::array_or_single(Some(data)),
            None => Self::array_or_single(payload.get("artists")),
        };
        Ok(artists.into_iter().filter_map(Self::parse_artist).collect())
    }
}
