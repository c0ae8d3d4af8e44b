use async_trait::async_trait;
use sofref_core::error::RemoteServiceError;
use sofref_core::types::Citation;
use std::sync::Arc;

#[async_trait]
pub trait TranscriptionService: Send + Sync {
    /// Returns the raw transcript text (markup included). Single attempt.
    async fn fetch_transcript(
        &self,
        transcription_id: &str,
        api_key: &str,
    ) -> Result<String, RemoteServiceError>;
}

#[async_trait]
pub trait ReferenceLinker: Send + Sync {
    /// Finds citations in already-sanitised text, in the order the linker reports them.
    async fn find_citations(&self, body: &str) -> Result<Vec<Citation>, RemoteServiceError>;
}

#[derive(Clone)]
pub struct Services {
    pub transcription: Arc<dyn TranscriptionService>,
    pub linker: Arc<dyn ReferenceLinker>,
}

impl Services {
    pub fn new(
        transcription: Arc<dyn TranscriptionService>,
        linker: Arc<dyn ReferenceLinker>,
    ) -> Self {
        Self {
            transcription,
            linker,
        }
    }
}
