// Sounds library module
// The track list comes from scanning the sounds directory; it is immutable
// once built and a rescan replaces it wholesale.

pub mod scanner;

pub use scanner::SoundScanner;

use std::path::PathBuf;

use serde::Serialize;

/// A playable ambient sound, identified by a stable id
#[derive(Debug, Clone, Serialize)]
pub struct Track {
    pub id: i64,
    pub name: String,
    pub path: PathBuf,
}

/// The scanned track list, ordered by file name so ids stay stable across
/// runs as long as the sounds directory is unchanged
#[derive(Debug, Default)]
pub struct SoundLibrary {
    tracks: Vec<Track>,
}

impl SoundLibrary {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn get(&self, id: i64) -> Option<&Track> {
        self.tracks.iter().find(|track| track.id == id)
    }

    /// The track played when the user hits play with nothing selected
    pub fn default_track(&self) -> Option<&Track> {
        self.tracks.first()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: i64, name: &str) -> Track {
        Track {
            id,
            name: name.to_string(),
            path: PathBuf::from(format!("{name}.mp3")),
        }
    }

    #[test]
    fn lookup_by_id() {
        let library = SoundLibrary::new(vec![track(0, "rain"), track(1, "train")]);
        assert_eq!(library.get(1).map(|t| t.name.as_str()), Some("train"));
        assert!(library.get(7).is_none());
    }

    #[test]
    fn default_track_is_first() {
        let library = SoundLibrary::new(vec![track(0, "rain"), track(1, "train")]);
        assert_eq!(library.default_track().map(|t| t.id), Some(0));

        let empty = SoundLibrary::default();
        assert!(empty.default_track().is_none());
        assert!(empty.is_empty());
    }
}
