//! Media naming and audio extraction.
//!
//! Every pipeline stage after extraction identifies a video by the
//! `<number>_<title>` prefix of its file name, so the grammars live here.

mod extract;

pub use extract::{extract_all, extract_audio, ExtractReport};

use crate::error::{Result, VidragError};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Supported audio file extensions.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "m4a", "ogg", "opus"];

/// Supported video file extensions (audio will be extracted).
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "webm", "flv", "wmv", "m4v", "mpeg", "mpg", "3gp",
];

/// Separator between the lesson title and the series name in course video names.
const TITLE_SEPARATOR: &str = " ｜ ";

/// Identity of a source video, as carried through file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoName {
    /// Lesson number, kept as text so leading zeros survive.
    pub number: String,
    /// Lesson title.
    pub title: String,
}

impl VideoName {
    /// File name of the extracted audio for this video.
    pub fn audio_file_name(&self) -> String {
        format!("{}_{}.mp3", self.number, self.title)
    }
}

/// Parse a `<number>_<title>.<ext>` file name.
///
/// A trailing `.json` is stripped first, so transcript files named after
/// their audio (`12_Intro.mp3.json`) parse to the same identity.
pub fn parse_source_name(file_name: &str) -> Result<VideoName> {
    let malformed = |reason: &str| {
        VidragError::MalformedInput(format!(
            "'{}' does not match <number>_<title>.<ext>: {}",
            file_name, reason
        ))
    };

    let name = file_name.strip_suffix(".json").unwrap_or(file_name);
    let (number, rest) = name.split_once('_').ok_or_else(|| malformed("missing '_'"))?;

    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(malformed("number must be digits"));
    }

    let (title, ext) = rest.rsplit_once('.').ok_or_else(|| malformed("missing extension"))?;
    if title.is_empty() {
        return Err(malformed("empty title"));
    }
    if ext.is_empty() {
        return Err(malformed("empty extension"));
    }

    Ok(VideoName {
        number: number.to_string(),
        title: title.to_string(),
    })
}

/// Parse a downloaded course video name such as
/// `Intro to HTML ｜ Sigma Web Development Course - Tutorial #3 [abc123].mp4`.
pub fn parse_video_file_name(file_name: &str) -> Result<VideoName> {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    let base = stem.split(" [").next().unwrap_or(stem);

    let number_regex = Regex::new(r"#(\d+)").expect("Invalid regex");
    let number_match = number_regex
        .captures_iter(base)
        .last()
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| {
            VidragError::MalformedInput(format!("'{}' has no '#<number>' lesson marker", file_name))
        })?;

    let title = match base.split_once(TITLE_SEPARATOR) {
        Some((title, _)) => title,
        None => base[..number_match.start() - 1].trim_end_matches([' ', '-']),
    }
    .trim();

    if title.is_empty() {
        return Err(VidragError::MalformedInput(format!(
            "'{}' has an empty title",
            file_name
        )));
    }

    Ok(VideoName {
        number: number_match.as_str().to_string(),
        title: title.replace(['/', '\\'], "-"),
    })
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Check if path is a supported audio file.
pub fn is_audio_file(path: &Path) -> bool {
    has_extension(path, AUDIO_EXTENSIONS)
}

/// Check if path is a supported video file.
pub fn is_video_file(path: &Path) -> bool {
    has_extension(path, VIDEO_EXTENSIONS)
}

/// List files in `dir` accepted by `filter`, sorted by file name.
pub fn list_files(dir: &Path, filter: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(VidragError::InvalidInput(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && filter(p))
        .collect();
    files.sort();

    Ok(files)
}

/// File name component of a path as UTF-8.
pub(crate) fn file_name_of(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| VidragError::MalformedInput(format!("Invalid file name: {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_name() {
        let name = parse_source_name("12_Intro to CSS.mp3").unwrap();
        assert_eq!(name.number, "12");
        assert_eq!(name.title, "Intro to CSS");

        let name = parse_source_name("007_Forms_and_Inputs.mp3.json").unwrap();
        assert_eq!(name.number, "007");
        assert_eq!(name.title, "Forms_and_Inputs");
    }

    #[test]
    fn test_parse_source_name_rejects_malformed() {
        for bad in ["Intro.mp3", "x1_Intro.mp3", "_Intro.mp3", "12_.mp3", "12_Intro", "12_Intro."] {
            assert!(
                matches!(parse_source_name(bad), Err(VidragError::MalformedInput(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_parse_video_file_name() {
        let name = parse_video_file_name(
            "Installing VS Code ｜ Sigma Web Development Course - Tutorial #1 [tVzUXW6siu0].mp4",
        )
        .unwrap();
        assert_eq!(name.number, "1");
        assert_eq!(name.title, "Installing VS Code");
        assert_eq!(name.audio_file_name(), "1_Installing VS Code.mp3");
    }

    #[test]
    fn test_parse_video_file_name_without_separator() {
        let name = parse_video_file_name("Tutorial #12 [Part 1].mp4").unwrap();
        assert_eq!(name.number, "12");
        assert_eq!(name.title, "Tutorial");
    }

    #[test]
    fn test_parse_video_file_name_rejects_unnumbered() {
        assert!(matches!(
            parse_video_file_name("holiday.mp4"),
            Err(VidragError::MalformedInput(_))
        ));
        assert!(matches!(
            parse_video_file_name("#4.mp4"),
            Err(VidragError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_media_extensions() {
        assert!(is_video_file(Path::new("lesson.MKV")));
        assert!(!is_video_file(Path::new("lesson.mp3")));
        assert!(is_audio_file(Path::new("/tmp/1_Intro.mp3")));
        assert!(!is_audio_file(Path::new("notes.txt")));
    }

    #[test]
    fn test_list_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["2_b.mp3", "10_c.mp3", "1_a.mp3", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let files = list_files(dir.path(), is_audio_file).unwrap();
        let names: Vec<_> = files.iter().map(|p| file_name_of(p).unwrap()).collect();
        assert_eq!(names, vec!["10_c.mp3", "1_a.mp3", "2_b.mp3"]);
    }
}
