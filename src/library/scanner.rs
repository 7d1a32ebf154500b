use std::path::{Path, PathBuf};

use lofty::prelude::{Accessor, TaggedFileExt};
use lofty::probe::Probe;
use walkdir::WalkDir;

use super::Track;

/// Extensions the decoder can actually play
const SUPPORTED_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "ogg", "wav", "m4a", "aac",
];

/// Scanner that turns the sounds directory into the ordered track list
pub struct SoundScanner;

impl SoundScanner {
    /// Scan a directory recursively and build tracks for every supported
    /// audio file, sorted by path so ids stay stable between runs
    pub fn scan<P: AsRef<Path>>(directory: P) -> Result<Vec<Track>, anyhow::Error> {
        let mut audio_files = Vec::new();

        for entry in WalkDir::new(directory)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            if let Some(extension) = path.extension() {
                let ext_str = extension.to_string_lossy().to_lowercase();
                if SUPPORTED_EXTENSIONS.contains(&ext_str.as_str()) {
                    audio_files.push(path.to_path_buf());
                }
            }
        }

        audio_files.sort();

        Ok(audio_files
            .into_iter()
            .enumerate()
            .map(|(index, path)| Track {
                id: index as i64,
                name: track_name(&path),
                path,
            })
            .collect())
    }
}

/// Display name: the embedded title tag when one exists, the file stem
/// otherwise
fn track_name(path: &Path) -> String {
    tagged_title(path).unwrap_or_else(|| stem_name(path))
}

fn tagged_title(path: &Path) -> Option<String> {
    let tagged_file = Probe::open(path).ok()?.read().ok()?;
    let tag = tagged_file.primary_tag().or(tagged_file.first_tag())?;
    tag.title().map(|title| title.to_string())
}

fn stem_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn scan_filters_and_orders_supported_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b_rain.mp3"), b"not really audio").unwrap();
        fs::write(dir.path().join("a_waves.wav"), b"not really audio").unwrap();
        fs::write(dir.path().join("notes.txt"), b"skip me").unwrap();
        fs::create_dir(dir.path().join("more")).unwrap();
        fs::write(dir.path().join("more").join("wind.aac"), b"not really audio").unwrap();

        let tracks = SoundScanner::scan(dir.path()).unwrap();

        let names: Vec<&str> = tracks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a_waves", "b_rain", "wind"]);
        // Ids follow the sorted order
        let ids: Vec<i64> = tracks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn scan_of_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("nope");
        let tracks = SoundScanner::scan(&gone).unwrap();
        assert!(tracks.is_empty());
    }

    #[test]
    fn untagged_files_fall_back_to_the_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("white_noise.mp3");
        fs::write(&path, b"garbage").unwrap();
        assert_eq!(track_name(&path), "white_noise");
    }
}
