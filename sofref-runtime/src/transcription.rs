use sofref_core::error::{RemoteServiceError, Service};
use sofref_providers::sofer::{SoferConfig, build_get_transcription_request};

/// Sofer.ai transcription lookup over HTTP.
#[derive(Debug, Clone)]
pub struct SoferTranscriptionService {
    base_url: String,
}

impl SoferTranscriptionService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl sofref_engine::traits::TranscriptionService for SoferTranscriptionService {
    async fn fetch_transcript(
        &self,
        transcription_id: &str,
        api_key: &str,
    ) -> Result<String, RemoteServiceError> {
        let cfg = SoferConfig {
            base_url: self.base_url.clone(),
            api_key: api_key.to_string(),
        };

        let req = build_get_transcription_request(&cfg, transcription_id).map_err(|e| {
            RemoteServiceError::Transport {
                service: Service::Transcription,
                message: format!("{e:#}"),
            }
        })?;
        log::debug!("fetching transcript: {req:?}");

        let resp = sofref_providers::runtime::execute(&req).await.map_err(|e| {
            RemoteServiceError::Transport {
                service: Service::Transcription,
                message: format!("{e:#}"),
            }
        })?;
        if !resp.is_success() {
            return Err(RemoteServiceError::Status {
                service: Service::Transcription,
                status: resp.status,
                body: resp.body_text(),
            });
        }

        sofref_providers::parse::parse_transcription(&resp.body).map_err(|e| {
            RemoteServiceError::Malformed {
                service: Service::Transcription,
                message: format!("{e:#}"),
            }
        })
    }
}
