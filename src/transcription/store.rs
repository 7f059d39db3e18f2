//! On-disk transcript store: one JSON file per video.

use super::TranscriptFile;
use crate::error::{Result, VidragError};
use crate::media::{file_name_of, list_files};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory of transcript JSON files.
pub struct TranscriptStore {
    dir: PathBuf,
}

impl TranscriptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the transcript written for an audio file.
    pub fn path_for(&self, audio_file_name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", audio_file_name))
    }

    /// All transcript files, sorted by file name.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        list_files(&self.dir, |p| {
            p.extension().and_then(|e| e.to_str()) == Some("json")
        })
    }

    /// Read and validate one transcript file.
    ///
    /// Missing fields, bad JSON, and chunks with `start >= end` are reported
    /// as malformed input naming the file.
    pub fn read(&self, path: &Path) -> Result<TranscriptFile> {
        let content = std::fs::read_to_string(path)?;
        let file: TranscriptFile = serde_json::from_str(&content).map_err(|e| {
            VidragError::MalformedInput(format!("{}: {}", path.display(), e))
        })?;

        for (i, chunk) in file.chunks.iter().enumerate() {
            if !(chunk.start < chunk.end) {
                return Err(VidragError::MalformedInput(format!(
                    "{}: chunk {} has start {} not before end {}",
                    path.display(),
                    i,
                    chunk.start,
                    chunk.end
                )));
            }
        }

        debug!("Read {} chunks from {}", file.chunks.len(), file_name_of(path)?);
        Ok(file)
    }

    /// Write the transcript for an audio file, returning its path.
    pub fn write(&self, audio_file_name: &str, file: &TranscriptFile) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(audio_file_name);
        std::fs::write(&path, serde_json::to_string(file)?)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::TranscriptChunk;

    fn sample() -> TranscriptFile {
        TranscriptFile {
            chunks: vec![TranscriptChunk {
                number: "1".to_string(),
                title: "Intro".to_string(),
                start: 0.0,
                end: 3.2,
                text: " Welcome to the course".to_string(),
            }],
            text: " Welcome to the course".to_string(),
        }
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::new(dir.path());

        let path = store.write("1_Intro.mp3", &sample()).unwrap();
        assert!(path.ends_with("1_Intro.mp3.json"));

        assert_eq!(store.list().unwrap(), vec![path.clone()]);
        assert_eq!(store.read(&path).unwrap(), sample());
    }

    #[test]
    fn test_reads_course_transcript_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2_Tags.mp3.json");
        std::fs::write(
            &path,
            r#"{"chunks": [{"number": "2", "title": "Tags", "start": 0.0, "end": 2.5, "text": " hi", "extra": 1}], "text": " hi"}"#,
        )
        .unwrap();

        let file = TranscriptStore::new(dir.path()).read(&path).unwrap();
        assert_eq!(file.chunks[0].title, "Tags");
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("3_Lists.mp3.json");
        std::fs::write(&path, r#"{"chunks": [{"number": "3", "title": "Lists", "start": 0.0, "text": "x"}], "text": "x"}"#).unwrap();

        let err = TranscriptStore::new(dir.path()).read(&path).unwrap_err();
        match err {
            VidragError::MalformedInput(msg) => assert!(msg.contains("end")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_inverted_time_range_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = sample();
        file.chunks[0].start = 5.0;
        let store = TranscriptStore::new(dir.path());
        let path = store.write("1_Intro.mp3", &file).unwrap();

        assert!(matches!(store.read(&path), Err(VidragError::MalformedInput(_))));
    }
}
