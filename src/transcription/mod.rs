//! Transcription module for vidrag.
//!
//! Turns extracted lesson audio into transcript files. By default speech is
//! translated to English, since the course audio is not in English.

mod models;
mod store;
mod whisper;

pub use models::{format_timestamp, Transcript, TranscriptChunk, TranscriptFile, TranscriptSegment};
pub use store::TranscriptStore;
pub use whisper::WhisperTranscriber;

use crate::error::Result;
use crate::media::{file_name_of, is_audio_file, list_files, parse_source_name};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file and return segments with timestamps.
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript>;
}

/// Outcome of transcribing a directory of audio files.
#[derive(Debug, Default)]
pub struct TranscribeReport {
    /// Newly written transcript files.
    pub written: Vec<PathBuf>,
    /// Audio files whose transcript already existed.
    pub skipped: Vec<PathBuf>,
    /// Audio files not named `<number>_<title>.<ext>`.
    pub rejected: Vec<(PathBuf, String)>,
}

/// Transcribe every `<number>_<title>` audio file in `audios_dir` into `store`.
///
/// Files are handled sequentially in name order; the first transcription
/// failure aborts the run.
#[instrument(skip_all, fields(audios_dir = %audios_dir.display()))]
pub async fn transcribe_all(
    transcriber: &dyn Transcriber,
    audios_dir: &Path,
    store: &TranscriptStore,
    force: bool,
) -> Result<TranscribeReport> {
    let audios = list_files(audios_dir, is_audio_file)?;
    info!("Found {} audio files", audios.len());

    let mut report = TranscribeReport::default();

    for audio in audios {
        let file_name = file_name_of(&audio)?;
        let name = match parse_source_name(file_name) {
            Ok(name) => name,
            Err(e) => {
                warn!("Skipping {}: {}", file_name, e);
                report.rejected.push((audio.clone(), e.to_string()));
                continue;
            }
        };

        if store.path_for(file_name).exists() && !force {
            report.skipped.push(audio.clone());
            continue;
        }

        info!("Transcribing lesson {} ({})", name.number, name.title);
        let transcript = transcriber.transcribe(&audio).await?;
        info!(
            "Transcribed {:.0}s into {} segments",
            transcript.duration_seconds(),
            transcript.segments.len()
        );
        let record = TranscriptFile::from_transcript(&name.number, &name.title, transcript);
        report.written.push(store.write(file_name, &record)?);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VidragError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedTranscriber {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transcriber for FixedTranscriber {
        async fn transcribe(&self, audio_path: &Path) -> Result<Transcript> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let stem = audio_path.file_stem().unwrap().to_string_lossy().to_string();
            Ok(Transcript::new(vec![
                TranscriptSegment::new(0.0, 2.0, format!("{} part one", stem)),
                TranscriptSegment::new(2.0, 4.0, format!("{} part two", stem)),
            ]))
        }
    }

    struct FailingTranscriber;

    #[async_trait]
    impl Transcriber for FailingTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<Transcript> {
            Err(VidragError::Transcription("quota exceeded".to_string()))
        }
    }

    #[tokio::test]
    async fn test_transcribe_all_writes_records() {
        let audios = tempfile::tempdir().unwrap();
        let jsons = tempfile::tempdir().unwrap();
        std::fs::write(audios.path().join("1_Intro.mp3"), b"").unwrap();
        std::fs::write(audios.path().join("sample.mp3"), b"").unwrap();

        let store = TranscriptStore::new(jsons.path());
        let transcriber = FixedTranscriber { calls: AtomicUsize::new(0) };

        let report = transcribe_all(&transcriber, audios.path(), &store, false).await.unwrap();

        assert_eq!(report.written.len(), 1);
        assert_eq!(report.rejected.len(), 1);

        let record = store.read(&report.written[0]).unwrap();
        assert_eq!(record.chunks.len(), 2);
        assert_eq!(record.chunks[1].number, "1");
        assert_eq!(record.chunks[1].title, "Intro");
        assert_eq!(record.text, "1_Intro part one 1_Intro part two");

        // Second run skips the existing transcript unless forced.
        let report = transcribe_all(&transcriber, audios.path(), &store, false).await.unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);

        transcribe_all(&transcriber, audios.path(), &store, true).await.unwrap();
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_transcription_failure_aborts() {
        let audios = tempfile::tempdir().unwrap();
        let jsons = tempfile::tempdir().unwrap();
        std::fs::write(audios.path().join("1_Intro.mp3"), b"").unwrap();

        let store = TranscriptStore::new(jsons.path());
        let result = transcribe_all(&FailingTranscriber, audios.path(), &store, false).await;

        assert!(matches!(result, Err(VidragError::Transcription(_))));
        assert!(store.list().unwrap().is_empty());
    }
}
