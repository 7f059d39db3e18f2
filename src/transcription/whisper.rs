//! OpenAI Whisper transcription implementation.

use super::{Transcriber, Transcript, TranscriptSegment};
use crate::config::{TranscriptionSettings, TranscriptionTask};
use crate::error::{Result, VidragError};
use crate::openai::create_client;
use async_openai::types::{
    AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs, CreateTranslationRequestArgs,
    TranscriptionSegment,
};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, instrument};

/// OpenAI Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    task: TranscriptionTask,
    language: Option<String>,
}

impl WhisperTranscriber {
    /// Create a transcriber that translates speech to English with `whisper-1`.
    pub fn new() -> Result<Self> {
        Self::with_config(&TranscriptionSettings::default())
    }

    /// Create a transcriber from settings.
    pub fn with_config(settings: &TranscriptionSettings) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: settings.model.clone(),
            task: settings.task,
            language: settings.language.clone(),
        })
    }

    pub fn task(&self) -> TranscriptionTask {
        self.task
    }

    fn audio_input(audio_path: &Path, bytes: Vec<u8>) -> AudioInput {
        AudioInput::from_vec_u8(
            audio_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("audio.mp3")
                .to_string(),
            bytes,
        )
    }

    async fn translate(&self, audio_path: &Path, bytes: Vec<u8>) -> Result<Transcript> {
        let request = CreateTranslationRequestArgs::default()
            .file(Self::audio_input(audio_path, bytes))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson)
            .build()
            .map_err(|e| VidragError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .translate_verbose_json(request)
            .await
            .map_err(|e| VidragError::Transcription(format!("Whisper API error: {}", e)))?;

        // Translation responses report duration as text.
        let duration = response.duration.to_string().parse::<f64>().unwrap_or(0.0);
        Ok(to_transcript(response.segments, response.text, duration))
    }

    async fn transcribe_spoken(&self, audio_path: &Path, bytes: Vec<u8>) -> Result<Transcript> {
        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(Self::audio_input(audio_path, bytes))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson);

        if let Some(lang) = &self.language {
            request_builder.language(lang);
        }

        let request = request_builder
            .build()
            .map_err(|e| VidragError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| VidragError::Transcription(format!("Whisper API error: {}", e)))?;

        Ok(to_transcript(response.segments, response.text, response.duration as f64))
    }
}

/// Convert API segments, falling back to a single segment spanning the audio.
///
/// Zero-length segments are dropped; every kept segment starts before it ends,
/// and the full text is rebuilt from the kept segments.
fn to_transcript(segments: Option<Vec<TranscriptionSegment>>, text: String, duration: f64) -> Transcript {
    let segments: Vec<TranscriptSegment> = match segments {
        Some(segs) => segs
            .into_iter()
            .filter(|s| s.start < s.end)
            .map(|s| TranscriptSegment::new(s.start as f64, s.end as f64, s.text))
            .collect(),
        None if duration > 0.0 => vec![TranscriptSegment::new(0.0, duration, text)],
        None => Vec::new(),
    };

    Transcript::new(segments)
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display(), task = %self.task))]
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript> {
        let bytes = tokio::fs::read(audio_path).await?;

        let transcript = match self.task {
            TranscriptionTask::Translate => self.translate(audio_path, bytes).await?,
            TranscriptionTask::Transcribe => self.transcribe_spoken(audio_path, bytes).await?,
        };

        debug!("Transcribed {} segments", transcript.segments.len());
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_segments_fall_back_to_full_text() {
        let transcript = to_transcript(None, "Namaste, welcome".to_string(), 12.5);

        assert_eq!(transcript.segments.len(), 1);
        assert_eq!(transcript.segments[0].end_seconds, 12.5);
        assert_eq!(transcript.full_text, "Namaste, welcome");
    }

    #[test]
    fn test_unknown_duration_without_segments_is_empty() {
        let transcript = to_transcript(None, "silence".to_string(), 0.0);
        assert!(transcript.segments.is_empty());
        assert!(transcript.full_text.is_empty());
    }

    fn segment(start: f32, end: f32, text: &str) -> TranscriptionSegment {
        TranscriptionSegment {
            id: 0,
            seek: 0,
            start,
            end,
            text: text.to_string(),
            tokens: Vec::new(),
            temperature: 0.0,
            avg_logprob: 0.0,
            compression_ratio: 0.0,
            no_speech_prob: 0.0,
        }
    }

    #[test]
    fn test_zero_length_segments_are_dropped_from_text() {
        let segments = vec![
            segment(0.0, 4.0, "Welcome to the course"),
            segment(4.0, 4.0, "blip"),
            segment(4.0, 9.5, "Today we learn HTML"),
        ];

        let transcript = to_transcript(
            Some(segments),
            "Welcome to the course blip Today we learn HTML".to_string(),
            9.5,
        );

        assert_eq!(transcript.segments.len(), 2);
        assert_eq!(transcript.full_text, "Welcome to the course Today we learn HTML");
    }
}
