use std::sync::Arc;

use sofref_core::config::PluginConfig;
use sofref_engine::store::SessionStore;
use sofref_engine::traits::{ReferenceLinker, Services, TranscriptionService};

use crate::linker::SefariaReferenceLinker;
use crate::transcription::SoferTranscriptionService;

/// HTTP-backed services for the configured endpoints.
pub fn build_services_from_config(cfg: &PluginConfig) -> Services {
    let transcription: Arc<dyn TranscriptionService> = Arc::new(SoferTranscriptionService::new(
        cfg.transcription_base_url.clone(),
    ));
    let linker: Arc<dyn ReferenceLinker> = Arc::new(SefariaReferenceLinker::new(
        cfg.linker_base_url.clone(),
        cfg.find_refs.clone(),
    ));
    Services::new(transcription, linker)
}

/// A fresh, idle session store wired to the configured endpoints.
pub fn build_store_from_config(cfg: &PluginConfig) -> SessionStore {
    SessionStore::new(build_services_from_config(cfg))
}
