//! Data models for transcription.

use serde::{Deserialize, Serialize};

/// Speech-to-text output for one audio file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Individual segments with timestamps.
    pub segments: Vec<TranscriptSegment>,
    /// Full transcript text.
    pub full_text: String,
}

impl Transcript {
    /// Create a new transcript from segments.
    pub fn new(segments: Vec<TranscriptSegment>) -> Self {
        let full_text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            segments,
            full_text,
        }
    }

    /// Total duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.segments.last().map(|s| s.end_seconds).unwrap_or(0.0)
    }
}

/// A single segment of a transcript with timestamp information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Transcribed text content.
    pub text: String,
}

impl TranscriptSegment {
    /// Create a new transcript segment.
    pub fn new(start_seconds: f64, end_seconds: f64, text: String) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text,
        }
    }
}

/// On-disk transcript record for one video.
///
/// Field names match the JSON files the embedding stage consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptFile {
    /// Timestamped chunks in speaking order.
    pub chunks: Vec<TranscriptChunk>,
    /// Full transcript text.
    pub text: String,
}

/// One timestamped chunk of a transcript file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    /// Lesson number of the source video.
    pub number: String,
    /// Lesson title of the source video.
    pub title: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Transcribed text.
    pub text: String,
}

impl TranscriptFile {
    /// Build a transcript record, stamping every chunk with the video identity.
    pub fn from_transcript(number: &str, title: &str, transcript: Transcript) -> Self {
        let chunks = transcript
            .segments
            .into_iter()
            .map(|s| TranscriptChunk {
                number: number.to_string(),
                title: title.to_string(),
                start: s.start_seconds,
                end: s.end_seconds,
                text: s.text,
            })
            .collect();

        Self {
            chunks,
            text: transcript.full_text,
        }
    }
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
