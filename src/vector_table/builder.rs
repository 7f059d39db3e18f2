//! Builds a vector table from a directory of transcripts.

use super::{Chunk, VectorTable};
use crate::embedding::{embed_checked, Embedder};
use crate::error::{Result, VidragError};
use crate::transcription::{TranscriptFile, TranscriptStore};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Hands out chunk ids in increasing order for the whole build.
#[derive(Debug, Default)]
pub struct ChunkIdGenerator {
    next: u64,
}

impl ChunkIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start numbering at `first`.
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The id the next call to `next_id` will return.
    pub fn peek(&self) -> u64 {
        self.next
    }
}

/// Result of a table build.
#[derive(Debug)]
pub struct BuildReport {
    pub table: VectorTable,
    /// Transcript files embedded.
    pub files: usize,
}

/// Embeds transcript chunks and assembles them into a [`VectorTable`].
pub struct TableBuilder {
    embedder: Arc<dyn Embedder>,
}

impl TableBuilder {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Embed every transcript in `store`, in file name order.
    ///
    /// Any failure aborts the whole build; nothing is returned for the files
    /// that succeeded before it.
    #[instrument(skip_all, fields(dir = %store.dir().display()))]
    pub async fn build(&self, store: &TranscriptStore) -> Result<BuildReport> {
        let paths = store.list()?;
        info!("Embedding {} transcript files", paths.len());

        let mut ids = ChunkIdGenerator::new();
        let mut rows = Vec::new();

        for path in &paths {
            let file = store.read(path)?;
            info!("Creating embeddings for {}", path.display());
            self.append_file(&file, &mut ids, &mut rows).await?;
        }

        let table = VectorTable::new(rows)?.with_embedding_model(self.embedder.model());
        info!("Built table with {} chunks from {} files", table.len(), paths.len());

        Ok(BuildReport {
            table,
            files: paths.len(),
        })
    }

    /// Embed one transcript's chunks in a single batch and append them to `rows`.
    ///
    /// Returns the number of rows appended.
    pub async fn append_file(
        &self,
        file: &TranscriptFile,
        ids: &mut ChunkIdGenerator,
        rows: &mut Vec<Chunk>,
    ) -> Result<usize> {
        if file.chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = file.chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embed_checked(self.embedder.as_ref(), &texts).await?;

        let expected = rows
            .first()
            .map(|c| c.embedding.len())
            .unwrap_or(embeddings[0].len());
        for embedding in &embeddings {
            if embedding.len() != expected {
                return Err(VidragError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }

        for (chunk, embedding) in file.chunks.iter().zip(embeddings) {
            rows.push(Chunk {
                chunk_id: ids.next_id(),
                video_number: chunk.number.clone(),
                video_title: chunk.title.clone(),
                start: chunk.start,
                end: chunk.end,
                text: chunk.text.clone(),
                embedding,
            });
        }

        debug!("Appended {} chunks", file.chunks.len());
        Ok(file.chunks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::TranscriptChunk;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Embeds each text as `[len, 1.0]` and records batch sizes.
    struct LengthEmbedder {
        batches: Mutex<Vec<usize>>,
    }

    impl LengthEmbedder {
        fn new() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Embedder for LengthEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.batches.lock().unwrap().push(texts.len());
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn model(&self) -> &str {
            "length"
        }
    }

    /// Drops the last vector of every batch.
    struct DroppingEmbedder;

    #[async_trait]
    impl Embedder for DroppingEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().skip(1).map(|_| vec![1.0, 0.0]).collect())
        }

        fn model(&self) -> &str {
            "dropping"
        }
    }

    /// Returns vectors whose length depends on the batch size.
    struct ShiftingEmbedder;

    #[async_trait]
    impl Embedder for ShiftingEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0; texts.len()]).collect())
        }

        fn model(&self) -> &str {
            "shifting"
        }
    }

    fn transcript(number: &str, title: &str, texts: &[&str]) -> TranscriptFile {
        let chunks = texts
            .iter()
            .enumerate()
            .map(|(i, text)| TranscriptChunk {
                number: number.to_string(),
                title: title.to_string(),
                start: i as f64 * 5.0,
                end: i as f64 * 5.0 + 5.0,
                text: text.to_string(),
            })
            .collect();
        TranscriptFile {
            chunks,
            text: texts.join(" "),
        }
    }

    fn write_store(files: &[(&str, TranscriptFile)]) -> (tempfile::TempDir, TranscriptStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TranscriptStore::new(dir.path());
        for (audio_name, file) in files {
            store.write(audio_name, file).unwrap();
        }
        (dir, store)
    }

    #[tokio::test]
    async fn test_ids_span_files_and_stay_unique() {
        let (_dir, store) = write_store(&[
            ("2_Tags.mp3", transcript("2", "Tags", &["div", "span"])),
            ("1_Intro.mp3", transcript("1", "Intro", &["hello", "world", "!"])),
            ("3_Empty.mp3", transcript("3", "Empty", &[])),
        ]);

        let embedder = Arc::new(LengthEmbedder::new());
        let report = TableBuilder::new(embedder.clone()).build(&store).await.unwrap();

        assert_eq!(report.files, 3);
        assert_eq!(report.table.len(), 5);
        assert_eq!(report.table.embedding_model(), Some("length"));

        let ids: Vec<u64> = report.table.rows().iter().map(|c| c.chunk_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());

        // Files are embedded in name order, one batch per non-empty file.
        assert_eq!(report.table.rows()[0].video_title, "Intro");
        assert_eq!(report.table.rows()[3].video_title, "Tags");
        assert_eq!(*embedder.batches.lock().unwrap(), vec![3, 2]);
    }

    #[tokio::test]
    async fn test_rows_keep_text_alignment() {
        let (_dir, store) = write_store(&[("1_Intro.mp3", transcript("1", "Intro", &["a", "abcd"]))]);

        let report = TableBuilder::new(Arc::new(LengthEmbedder::new()))
            .build(&store)
            .await
            .unwrap();

        for row in report.table.rows() {
            assert_eq!(row.embedding[0], row.text.len() as f32);
        }
    }

    #[tokio::test]
    async fn test_short_embedding_response_fails() {
        let (_dir, store) = write_store(&[("1_Intro.mp3", transcript("1", "Intro", &["a", "b", "c"]))]);

        let result = TableBuilder::new(Arc::new(DroppingEmbedder)).build(&store).await;
        assert!(matches!(result, Err(VidragError::EmbeddingService(_))));
    }

    #[tokio::test]
    async fn test_dimension_change_between_files_fails() {
        let (_dir, store) = write_store(&[
            ("1_Intro.mp3", transcript("1", "Intro", &["a", "b"])),
            ("2_Tags.mp3", transcript("2", "Tags", &["c", "d", "e"])),
        ]);

        let result = TableBuilder::new(Arc::new(ShiftingEmbedder)).build(&store).await;
        assert!(matches!(
            result,
            Err(VidragError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[tokio::test]
    async fn test_malformed_transcript_aborts_build() {
        let (dir, store) = write_store(&[("1_Intro.mp3", transcript("1", "Intro", &["a"]))]);
        std::fs::write(dir.path().join("2_Bad.mp3.json"), r#"{"chunks": [{"text": "x"}]}"#).unwrap();

        let result = TableBuilder::new(Arc::new(LengthEmbedder::new())).build(&store).await;
        assert!(matches!(result, Err(VidragError::MalformedInput(_))));
    }

    #[test]
    fn test_id_generator() {
        let mut ids = ChunkIdGenerator::starting_at(10);
        assert_eq!(ids.next_id(), 10);
        assert_eq!(ids.next_id(), 11);
        assert_eq!(ids.peek(), 12);
    }
}
