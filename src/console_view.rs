//! Terminal rendering for search view snapshots.

use std::io::Write;

use log::warn;
use tokio::sync::broadcast::{error::RecvError, Receiver};

use crate::protocol::{
    Candidate, Message, SearchCategory, SearchFilter, SearchMessage, SearchViewSnapshot,
};

/// Renders published search snapshots to the terminal.
pub struct ConsoleView {
    bus_consumer: Receiver<Message>,
}

impl ConsoleView {
    pub fn new(bus_consumer: Receiver<Message>) -> Self {
        Self { bus_consumer }
    }

    /// Starts the blocking event loop.
    pub fn run(&mut self) {
        loop {
            match self.bus_consumer.blocking_recv() {
                Ok(Message::Search(SearchMessage::ResultsUpdated(snapshot))) => {
                    let mut stdout = std::io::stdout();
                    let _ = writeln!(stdout, "{}", render_snapshot(&snapshot));
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        "ConsoleView lagged on control bus, skipped {} message(s)",
                        skipped
                    );
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

fn filter_label(filter: SearchFilter) -> &'static str {
    match filter {
        SearchFilter::All => "all",
        SearchFilter::Songs => "songs",
        SearchFilter::Albums => "albums",
        SearchFilter::Artists => "artists",
    }
}

fn category_label(category: SearchCategory) -> &'static str {
    match category {
        SearchCategory::Song => "song",
        SearchCategory::Album => "album",
        SearchCategory::Artist => "artist",
    }
}

fn candidate_line(candidate: &Candidate) -> String {
    match candidate {
        Candidate::Song(song) => format!(
            "{} - {} [{}]",
            song.title,
            song.artist.name(),
            song.duration_label
        ),
        Candidate::Album(album) => format!("{} - {}", album.title, album.artist.name()),
        Candidate::Artist(artist) => artist.name.clone(),
    }
}

/// Formats one snapshot as a multi-line block.
pub fn render_snapshot(snapshot: &SearchViewSnapshot) -> String {
    if snapshot.query.is_empty() {
        return "Type to search the catalog.".to_string();
    }

    let mut lines = vec![format!(
        "Results for \"{}\" ({})",
        snapshot.query,
        filter_label(snapshot.filter)
    )];
    if let Some(top_result) = &snapshot.top_result {
        lines.push(format!(
            "Top result: {} ({})",
            candidate_line(&top_result.candidate),
            category_label(top_result.candidate.kind())
        ));
    }

    let results = &snapshot.results;
    if results.is_empty() {
        lines.push("No results.".to_string());
        return lines.join("\n");
    }
    if !results.songs.is_empty() {
        lines.push("Songs:".to_string());
        for song in &results.songs {
            lines.push(format!("  {}", candidate_line(&Candidate::Song(song.clone()))));
        }
    }
    if !results.albums.is_empty() {
        lines.push("Albums:".to_string());
        for album in &results.albums {
            lines.push(format!(
                "  {}",
                candidate_line(&Candidate::Album(album.clone()))
            ));
        }
    }
    if !results.artists.is_empty() {
        lines.push("Artists:".to_string());
        for artist in &results.artists {
            lines.push(format!(
                "  {}",
                candidate_line(&Candidate::Artist(artist.clone()))
            ));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::render_snapshot;
    use crate::protocol::{
        ArtistCandidate, ArtistRef, Candidate, ResultBundle, ScoredCandidate, SearchFilter,
        SearchViewSnapshot, SongCandidate,
    };

    fn sample_snapshot() -> SearchViewSnapshot {
        let artist = ArtistCandidate {
            id: "ar1".to_string(),
            name: "Adele".to_string(),
        };
        SearchViewSnapshot {
            query: "Adele".to_string(),
            filter: SearchFilter::All,
            generation: 3,
            top_result: Some(ScoredCandidate {
                candidate: Candidate::Artist(artist.clone()),
                score: 300,
            }),
            results: ResultBundle {
                songs: vec![SongCandidate {
                    id: "s1".to_string(),
                    title: "Hello".to_string(),
                    artist: ArtistRef::Name("Adele".to_string()),
                    duration_label: "4:55".to_string(),
                }],
                albums: Vec::new(),
                artists: vec![artist],
            },
        }
    }

    #[test]
    fn test_render_includes_top_result_and_sections() {
        let rendered = render_snapshot(&sample_snapshot());

        assert!(rendered.contains("Results for \"Adele\" (all)"));
        assert!(rendered.contains("Top result: Adele (artist)"));
        assert!(rendered.contains("Songs:"));
        assert!(rendered.contains("  Hello - Adele [4:55]"));
        assert!(rendered.contains("Artists:"));
        assert!(!rendered.contains("Albums:"));
    }

    #[test]
    fn test_render_empty_query_prompts_for_input() {
        let snapshot = SearchViewSnapshot {
            query: String::new(),
            filter: SearchFilter::All,
            generation: 1,
            top_result: None,
            results: ResultBundle::default(),
        };
        assert_eq!(render_snapshot(&snapshot), "Type to search the catalog.");
    }

    #[test]
    fn test_render_no_match_reports_no_results() {
        let snapshot = SearchViewSnapshot {
            query: "xyzzy".to_string(),
            filter: SearchFilter::Songs,
            generation: 2,
            top_result: None,
            results: ResultBundle::default(),
        };

        let rendered = render_snapshot(&snapshot);
        assert!(rendered.contains("Results for \"xyzzy\" (songs)"));
        assert!(rendered.contains("No results."));
    }
}
