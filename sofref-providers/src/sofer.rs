use crate::request::{Body, HttpRequest};
use anyhow::{Context, anyhow};
use url::Url;

const TRANSCRIPTIONS_PATH: [&str; 2] = ["v1", "transcriptions"];

#[derive(Clone, PartialEq, Eq)]
pub struct SoferConfig {
    pub base_url: String,
    pub api_key: String,
}

impl std::fmt::Debug for SoferConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoferConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// `GET <base>/v1/transcriptions/<id>`.
///
/// An empty API key produces an anonymous request (no `Authorization` header); the
/// service decides whether that is acceptable.
pub fn build_get_transcription_request(
    cfg: &SoferConfig,
    transcription_id: &str,
) -> anyhow::Result<HttpRequest> {
    let mut url = Url::parse(&cfg.base_url)
        .with_context(|| format!("invalid transcription base url: {}", cfg.base_url))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("transcription base url cannot carry a path: {}", cfg.base_url))?
        .pop_if_empty()
        .extend(TRANSCRIPTIONS_PATH)
        .push(transcription_id);

    let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
    if !cfg.api_key.trim().is_empty() {
        headers.push(("Authorization".into(), format!("Bearer {}", cfg.api_key)));
    }

    Ok(HttpRequest {
        method: "GET".into(),
        url: url.into(),
        headers,
        body: Body::Empty,
    })
}
