//! Audio extraction from course videos using ffmpeg.

use super::{file_name_of, is_video_file, list_files, parse_video_file_name};
use crate::error::{Result, VidragError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Outcome of extracting audio from a directory of videos.
#[derive(Debug, Default)]
pub struct ExtractReport {
    /// Newly written audio files.
    pub extracted: Vec<PathBuf>,
    /// Audio files that already existed.
    pub skipped: Vec<PathBuf>,
    /// Video files whose names could not be parsed, with the reason.
    pub rejected: Vec<(PathBuf, String)>,
}

/// Extract audio for every video in `videos_dir` into `audios_dir`.
///
/// Videos are processed one at a time in file name order. Existing outputs are
/// kept unless `force` is set. Badly named videos are reported, not fatal;
/// an ffmpeg failure aborts the run.
#[instrument(skip_all, fields(videos_dir = %videos_dir.display()))]
pub async fn extract_all(videos_dir: &Path, audios_dir: &Path, force: bool) -> Result<ExtractReport> {
    std::fs::create_dir_all(audios_dir)?;

    let videos = list_files(videos_dir, is_video_file)?;
    info!("Found {} videos", videos.len());

    let mut report = ExtractReport::default();

    for video in videos {
        let name = match parse_video_file_name(file_name_of(&video)?) {
            Ok(name) => name,
            Err(e) => {
                warn!("Skipping {:?}: {}", video, e);
                report.rejected.push((video, e.to_string()));
                continue;
            }
        };

        let target = audios_dir.join(name.audio_file_name());
        if target.exists() && !force {
            debug!("Audio already extracted: {:?}", target);
            report.skipped.push(target);
            continue;
        }

        info!("Extracting lesson {} ({})", name.number, name.title);
        extract_audio(&video, &target).await?;
        report.extracted.push(target);
    }

    Ok(report)
}

/// Converts a video's audio track to MP3 using ffmpeg.
pub async fn extract_audio(source: &Path, dest: &Path) -> Result<()> {
    debug!("Converting {:?} to {:?}", source, dest);

    let result = Command::new("ffmpeg")
        .arg("-i").arg(source)
        .arg("-vn")
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("2")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(VidragError::ToolFailed(format!(
                "ffmpeg could not extract audio from {:?}: {}",
                source,
                err.trim()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(VidragError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(VidragError::ToolFailed(format!("ffmpeg error: {e}"))),
    }
}
