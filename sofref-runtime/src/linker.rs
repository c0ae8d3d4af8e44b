use sofref_core::config::FindRefsOptions;
use sofref_core::error::{RemoteServiceError, Service};
use sofref_core::types::Citation;
use sofref_providers::sefaria::{LinkerText, build_find_refs_request};

/// Sefaria linker (`find-refs`) client. Only the body section of the response is used.
#[derive(Debug, Clone)]
pub struct SefariaReferenceLinker {
    base_url: String,
    options: FindRefsOptions,
}

impl SefariaReferenceLinker {
    pub fn new(base_url: impl Into<String>, options: FindRefsOptions) -> Self {
        Self {
            base_url: base_url.into(),
            options,
        }
    }
}

#[async_trait::async_trait]
impl sofref_engine::traits::ReferenceLinker for SefariaReferenceLinker {
    async fn find_citations(&self, body: &str) -> Result<Vec<Citation>, RemoteServiceError> {
        let req =
            build_find_refs_request(&self.base_url, &LinkerText::body_only(body), &self.options);

        let resp = sofref_providers::runtime::execute(&req).await.map_err(|e| {
            RemoteServiceError::Transport {
                service: Service::ReferenceLinker,
                message: format!("{e:#}"),
            }
        })?;
        if !resp.is_success() {
            return Err(RemoteServiceError::Status {
                service: Service::ReferenceLinker,
                status: resp.status,
                body: resp.body_text(),
            });
        }

        let parsed = sofref_providers::parse::parse_find_refs(&resp.body).map_err(|e| {
            RemoteServiceError::Malformed {
                service: Service::ReferenceLinker,
                message: format!("{e:#}"),
            }
        })?;
        Ok(parsed.body_citations())
    }
}
