//! Pipeline coordination for vidrag.
//!
//! Wires settings into each stage: videos to audio, audio to transcripts,
//! transcripts to a vector table, and the table to answers.

use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OllamaEmbedder};
use crate::error::Result;
use crate::media::{extract_all, ExtractReport};
use crate::ollama::OllamaClient;
use crate::rag::{AnswerComposer, Generator, OllamaGenerator, RagEngine, RetrievalEngine};
use crate::transcription::{transcribe_all, TranscribeReport, Transcriber, TranscriptStore, WhisperTranscriber};
use crate::vector_table::{TableBuilder, VectorTable};
use std::sync::Arc;
use tracing::{info, instrument};

/// Result of an indexing run.
#[derive(Debug)]
pub struct IndexResult {
    /// Transcript files embedded.
    pub files: usize,
    /// Rows in the written table.
    pub chunks: usize,
    pub dimensions: usize,
}

/// Entry point for every pipeline stage.
pub struct Pipeline {
    settings: Settings,
    prompts: Prompts,
}

impl Pipeline {
    /// Create a pipeline, loading prompts from the configured directory.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        Ok(Self { settings, prompts })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn transcript_store(&self) -> TranscriptStore {
        TranscriptStore::new(self.settings.transcripts_dir())
    }

    /// Build the Ollama embedder described by the settings.
    pub fn embedder(&self) -> Result<Arc<dyn Embedder>> {
        Ok(Arc::new(OllamaEmbedder::with_client(
            OllamaClient::with_config(&self.settings.ollama)?,
            &self.settings.embedding.model,
        )))
    }

    /// Build the Ollama generator, optionally overriding the model.
    pub fn generator(&self, model: Option<&str>) -> Result<Arc<dyn Generator>> {
        let model = model.unwrap_or(&self.settings.generation.model);
        Ok(Arc::new(OllamaGenerator::with_client(
            OllamaClient::with_config(&self.settings.ollama)?,
            model,
        )))
    }

    /// Extract MP3 audio from every lesson video.
    #[instrument(skip(self))]
    pub async fn extract(&self, force: bool) -> Result<ExtractReport> {
        extract_all(&self.settings.videos_dir(), &self.settings.audios_dir(), force).await
    }

    /// Transcribe every extracted audio file with Whisper.
    pub async fn transcribe(&self, force: bool) -> Result<TranscribeReport> {
        let transcriber = WhisperTranscriber::with_config(&self.settings.transcription)?;
        info!("Transcribing with task '{}'", transcriber.task());
        self.transcribe_with(&transcriber, force).await
    }

    /// Transcribe with a caller-supplied transcriber.
    #[instrument(skip(self, transcriber))]
    pub async fn transcribe_with(&self, transcriber: &dyn Transcriber, force: bool) -> Result<TranscribeReport> {
        let store = self.transcript_store();
        std::fs::create_dir_all(store.dir())?;
        transcribe_all(transcriber, &self.settings.audios_dir(), &store, force).await
    }

    /// Embed every transcript and replace the persisted table.
    pub async fn index(&self) -> Result<IndexResult> {
        let embedder = self.embedder()?;
        self.index_with(embedder).await
    }

    /// Index with a caller-supplied embedder.
    ///
    /// The existing table is only replaced once the whole build succeeds.
    #[instrument(skip(self, embedder), fields(model = %embedder.model()))]
    pub async fn index_with(&self, embedder: Arc<dyn Embedder>) -> Result<IndexResult> {
        let report = TableBuilder::new(embedder)
            .build(&self.transcript_store())
            .await?;

        let table_path = self.settings.table_path();
        report.table.save(&table_path)?;
        info!("Wrote {} chunks to {:?}", report.table.len(), table_path);

        Ok(IndexResult {
            files: report.files,
            chunks: report.table.len(),
            dimensions: report.table.dimensions(),
        })
    }

    /// Load the persisted vector table.
    pub fn load_table(&self) -> Result<VectorTable> {
        VectorTable::load(&self.settings.table_path())
    }

    /// Retrieval engine over the persisted table.
    ///
    /// `k` and `min_score` fall back to the retrieval settings.
    pub fn retrieval_engine(&self, k: Option<usize>, min_score: Option<f32>) -> Result<RetrievalEngine> {
        let table = Arc::new(self.load_table()?);
        Ok(self.retrieval_engine_with(table, self.embedder()?, k, min_score))
    }

    pub fn retrieval_engine_with(
        &self,
        table: Arc<VectorTable>,
        embedder: Arc<dyn Embedder>,
        k: Option<usize>,
        min_score: Option<f32>,
    ) -> RetrievalEngine {
        RetrievalEngine::new(table, embedder)
            .with_top_k(k.unwrap_or(self.settings.retrieval.top_k))
            .with_min_score(min_score.or(self.settings.retrieval.min_score))
    }

    /// Question answering over the persisted table.
    pub fn rag_engine(&self, k: Option<usize>, model: Option<&str>) -> Result<RagEngine> {
        let retrieval = self.retrieval_engine(k, None)?;
        Ok(self.rag_engine_with(retrieval, self.generator(model)?))
    }

    pub fn rag_engine_with(&self, retrieval: RetrievalEngine, generator: Arc<dyn Generator>) -> RagEngine {
        let composer = AnswerComposer::new(generator).with_prompts(self.prompts.clone());
        RagEngine::new(retrieval, composer)
    }
}
