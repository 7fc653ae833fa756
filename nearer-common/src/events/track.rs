//! Track value type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One resolved, playable audio item with its metadata
///
/// Created once an add request has been resolved and probed; never mutated
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    /// Queue entry id; player notifications refer to tracks by this id
    pub id: Uuid,
    /// Display name of the client that added the track
    pub added_by: String,
    /// Reference the client submitted (e.g. a page URL or catalog key)
    pub track_ref: String,
    /// Playable stream locator handed to the player
    pub url: String,
    pub title: String,
    /// Duration in whole seconds
    pub duration: u64,
    /// Thumbnail image URL (may be empty)
    pub thumb: String,
    /// Large thumbnail URL (may be empty)
    pub thumb_big: String,
    /// When the track was committed to the queue
    pub added_at: DateTime<Utc>,
}

/// Renders a queue listing, newest first, marking the current track with `-`
///
/// ```text
/// current song: 1 of 3
///   Third
/// - Second
///   First
/// ```
pub fn render_queue(songs: &[Track], current: Option<usize>) -> String {
    let mut out = match current {
        Some(idx) => format!("current song: {} of {}\n", idx, songs.len()),
        None => format!("nothing playing ({} in history)\n", songs.len()),
    };
    for (i, song) in songs.iter().enumerate() {
        let marker = if Some(i) == current { '-' } else { ' ' };
        out.push_str(&format!("{} {}\n", marker, song.title));
    }
    out
}
