//! Track queue with bounded history
//!
//! Newest track at the head (index 0). The cursor splits the queue:
//! - `0..cursor`: added but not yet played
//! - `cursor`: currently playing
//! - `cursor+1..`: already played, kept for display
//!
//! Finishing a track moves the cursor toward the head. `None` means the
//! queue is exhausted (nothing playing); on the wire that is index `-1`.

use nearer_common::{render_queue, Track};
use std::collections::VecDeque;

/// Already-played tracks kept when no limit is configured
pub const DEFAULT_MAX_HISTORY: usize = 7;

/// Queue + cursor, always mutated together
#[derive(Debug)]
pub struct TrackQueue {
    tracks: VecDeque<Track>,
    cursor: Option<usize>,
    max_history: usize,
}

impl TrackQueue {
    pub fn new(max_history: usize) -> Self {
        Self {
            tracks: VecDeque::new(),
            cursor: None,
            max_history,
        }
    }

    /// Insert a track at the head
    ///
    /// The cursor moves by one so it keeps pointing at the same track, or
    /// lands on the new track if the queue was exhausted. Returns the new
    /// cursor.
    pub fn push(&mut self, track: Track) -> usize {
        self.tracks.push_front(track);
        let cursor = self.cursor.map_or(0, |c| c + 1);
        self.cursor = Some(cursor);
        self.trim();
        cursor
    }

    /// Move past the current track
    ///
    /// Returns false (and changes nothing) if the queue was already
    /// exhausted.
    pub fn advance(&mut self) -> bool {
        match self.cursor {
            None => false,
            Some(cursor) => {
                self.cursor = cursor.checked_sub(1);
                self.trim();
                true
            }
        }
    }

    /// Drop history beyond `cursor + max_history`
    fn trim(&mut self) {
        let keep = self.cursor.map_or(0, |c| c + 1) + self.max_history;
        self.tracks.truncate(keep);
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_none()
    }

    /// Currently playing track, if any
    pub fn current(&self) -> Option<&Track> {
        self.cursor.and_then(|c| self.tracks.get(c))
    }

    /// Number of already-played tracks retained
    pub fn played(&self) -> usize {
        self.tracks.len() - self.cursor.map_or(0, |c| c + 1)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Owned copy of all tracks, newest first
    pub fn snapshot(&self) -> Vec<Track> {
        self.tracks.iter().cloned().collect()
    }

    /// Human-readable listing marking the current track
    pub fn render(&self) -> String {
        render_queue(&self.snapshot(), self.cursor)
    }
}

impl Default for TrackQueue {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}
