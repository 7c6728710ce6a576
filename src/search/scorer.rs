//! Relevance scoring across search categories.
//!
//! A fixed additive heuristic, not a trained ranking model: no
//! normalization and no term weighting. It is adequate for picking one
//! featured match out of a small candidate set.

use crate::protocol::{Candidate, ResultBundle, ScoredCandidate, SearchCategory};

const EXACT_NAME_SCORE: u32 = 100;
const PREFIX_NAME_SCORE: u32 = 50;
const SUBSTRING_NAME_SCORE: u32 = 25;
// Artists dominate the top slot when their name matches at all, so that
// ambiguous queries lead to the artist page rather than a song or album.
const ARTIST_EXACT_BONUS: u32 = 200;
const ARTIST_SUBSTRING_BONUS: u32 = 100;
const ALBUM_EXACT_TITLE_BONUS: u32 = 50;
const ALBUM_ARTIST_MATCH_BONUS: u32 = 30;
// Kept below the name-match scores so a song whose title matches beats a
// song that merely shares an artist with the query.
const SONG_ARTIST_EXACT_BONUS: u32 = 40;
const SONG_ARTIST_SUBSTRING_BONUS: u32 = 15;

/// Scores one candidate against a query. Deterministic and pure; a zero
/// score means the candidate does not compete for the top-result slot.
pub fn score_candidate(candidate: &Candidate, query: &str) -> u32 {
    let search = query.trim().to_lowercase();
    if search.is_empty() {
        return 0;
    }
    let item_name = candidate.display_name().to_lowercase();
    let artist_name = candidate.artist_name().map(str::to_lowercase);

    let mut score = if item_name == search {
        EXACT_NAME_SCORE
    } else if item_name.starts_with(&search) {
        PREFIX_NAME_SCORE
    } else if item_name.contains(&search) {
        SUBSTRING_NAME_SCORE
    } else {
        0
    };

    match candidate.kind() {
        SearchCategory::Artist => {
            if item_name == search {
                score += ARTIST_EXACT_BONUS;
            } else if item_name.contains(&search) {
                score += ARTIST_SUBSTRING_BONUS;
            }
        }
        SearchCategory::Album => {
            if item_name == search {
                score += ALBUM_EXACT_TITLE_BONUS;
            } else if artist_name
                .as_deref()
                .is_some_and(|artist| artist.contains(&search))
            {
                score += ALBUM_ARTIST_MATCH_BONUS;
            }
        }
        SearchCategory::Song => {
            if let Some(artist) = artist_name.as_deref() {
                if artist == search {
                    score += SONG_ARTIST_EXACT_BONUS;
                } else if artist.contains(&search) {
                    score += SONG_ARTIST_SUBSTRING_BONUS;
                }
            }
        }
    }
    score
}

/// Picks the single highest-scoring candidate across all categories.
///
/// Candidates are enumerated songs, then artists, then albums, and only a
/// strictly higher score displaces the current leader, so ties go to the
/// earliest enumerated candidate.
pub fn select_top_result(bundle: &ResultBundle, query: &str) -> Option<ScoredCandidate> {
    let songs = bundle.songs.iter().cloned().map(Candidate::Song);
    let artists = bundle.artists.iter().cloned().map(Candidate::Artist);
    let albums = bundle.albums.iter().cloned().map(Candidate::Album);

    let mut top_result: Option<ScoredCandidate> = None;
    for candidate in songs.chain(artists).chain(albums) {
        let score = score_candidate(&candidate, query);
        if score == 0 {
            continue;
        }
        let displaces = match &top_result {
            None => true,
            Some(current) => score > current.score,
        };
        if displaces {
            top_result = Some(ScoredCandidate { candidate, score });
        }
    }
    top_result
}
