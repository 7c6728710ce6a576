//! Event-bus protocol shared by all runtime components.
//!
//! This module defines the message payloads exchanged between the search
//! pipeline, the console view, and configuration handlers, plus the
//! candidate/result types those payloads carry.

use crate::config::Config;

/// Top-level envelope for all bus traffic.
#[derive(Debug, Clone)]
pub enum Message {
    Search(SearchMessage),
    Config(ConfigMessage),
}

/// Search-domain commands and notifications.
#[derive(Debug, Clone)]
pub enum SearchMessage {
    /// Debounced query text as last edited by the user.
    SetQuery(String),
    /// Active result tab changed; repartitions the held bundle, no refetch.
    SetFilter(SearchFilter),
    /// A fetch cycle finished. `generation` identifies the cycle so the
    /// manager can discard completions superseded by a newer query.
    FetchCompleted {
        generation: u64,
        key: String,
        bundle: ResultBundle,
    },
    /// New renderable search state for view components.
    ResultsUpdated(SearchViewSnapshot),
}

/// Runtime configuration updates.
#[derive(Debug, Clone)]
pub enum ConfigMessage {
    ConfigChanged(Config),
}

/// Result tab selected in the search view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchFilter {
    All,
    Songs,
    Albums,
    Artists,
}

impl SearchFilter {
    /// Parses a user-facing tab label.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "songs" => Some(Self::Songs),
            "albums" => Some(Self::Albums),
            "artists" => Some(Self::Artists),
            _ => None,
        }
    }
}

/// Artist field as carried by the catalog wire format: either a bare name
/// or a reference object exposing a `name`.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(untagged)]
pub enum ArtistRef {
    Name(String),
    Entity {
        #[serde(default)]
        id: String,
        name: String,
    },
}

impl ArtistRef {
    /// Display name regardless of wire shape.
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Entity { name, .. } => name,
        }
    }
}

/// One song candidate returned by the catalog.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct SongCandidate {
    pub id: String,
    pub title: String,
    pub artist: ArtistRef,
    pub duration_label: String,
}

/// One album candidate returned by the catalog.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AlbumCandidate {
    pub id: String,
    pub title: String,
    pub artist: ArtistRef,
}

/// One artist candidate returned by the catalog.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ArtistCandidate {
    pub id: String,
    pub name: String,
}

/// Category discriminant for candidates of any shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchCategory {
    Song,
    Album,
    Artist,
}

/// Any song, album, or artist record considered during one search.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    Song(SongCandidate),
    Album(AlbumCandidate),
    Artist(ArtistCandidate),
}

impl Candidate {
    pub fn kind(&self) -> SearchCategory {
        match self {
            Self::Song(_) => SearchCategory::Song,
            Self::Album(_) => SearchCategory::Album,
            Self::Artist(_) => SearchCategory::Artist,
        }
    }

    /// Display name or title used for base name matching.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Song(song) => &song.title,
            Self::Album(album) => &album.title,
            Self::Artist(artist) => &artist.name,
        }
    }

    /// Associated artist name, when the candidate shape carries one.
    pub fn artist_name(&self) -> Option<&str> {
        match self {
            Self::Song(song) => Some(song.artist.name()),
            Self::Album(album) => Some(album.artist.name()),
            Self::Artist(_) => None,
        }
    }
}

/// Unified per-category result set for one query. Arrays stay in backend
/// order; categories that failed or matched nothing are empty.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ResultBundle {
    pub songs: Vec<SongCandidate>,
    pub albums: Vec<AlbumCandidate>,
    pub artists: Vec<ArtistCandidate>,
}

impl ResultBundle {
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty() && self.albums.is_empty() && self.artists.is_empty()
    }

    /// Projects the bundle under one result tab. `All` passes the bundle
    /// through unchanged; any other tab keeps its category and empties the
    /// rest. Pure projection, the held bundle is never mutated.
    pub fn partitioned(&self, filter: SearchFilter) -> ResultBundle {
        match filter {
            SearchFilter::All => self.clone(),
            SearchFilter::Songs => ResultBundle {
                songs: self.songs.clone(),
                ..ResultBundle::default()
            },
            SearchFilter::Albums => ResultBundle {
                albums: self.albums.clone(),
                ..ResultBundle::default()
            },
            SearchFilter::Artists => ResultBundle {
                artists: self.artists.clone(),
                ..ResultBundle::default()
            },
        }
    }
}

/// Candidate plus its relevance score. Only candidates scoring above zero
/// compete for the featured top-result slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: u32,
}

/// Renderable search state published after every accepted pipeline step.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchViewSnapshot {
    /// Trimmed query the results belong to.
    pub query: String,
    pub filter: SearchFilter,
    /// Pipeline generation the snapshot was produced under.
    pub generation: u64,
    pub top_result: Option<ScoredCandidate>,
    /// Results already projected under `filter`.
    pub results: ResultBundle,
}
