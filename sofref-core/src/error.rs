use thiserror::Error;

/// The remote collaborator a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Transcription,
    ReferenceLinker,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Service::Transcription => f.write_str("transcription service"),
            Service::ReferenceLinker => f.write_str("reference linker"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteServiceError {
    #[error("{service} returned status {status}: {body}")]
    Status {
        service: Service,
        status: u16,
        body: String,
    },
    #[error("{service} returned a malformed payload: {message}")]
    Malformed { service: Service, message: String },
    #[error("{service} request failed: {message}")]
    Transport { service: Service, message: String },
}
