use serde::{Deserialize, Serialize};

/// Message surfaced in `ReferenceState::error` when the citation lookup fails.
pub const REFERENCES_FAILED_MESSAGE: &str = "Failed to load references.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Finished,
    Error,
}

/// Identifies one request lineage. Results tagged with an older generation are stale.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    pub api_key: String,
    pub transcription_id: String,
}

impl Settings {
    pub fn new(api_key: impl Into<String>, transcription_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            transcription_id: transcription_id.into(),
        }
    }

    pub fn has_transcription_id(&self) -> bool {
        !self.transcription_id.is_empty()
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let api_key = if self.api_key.is_empty() {
            ""
        } else {
            "[REDACTED]"
        };
        f.debug_struct("Settings")
            .field("api_key", &api_key)
            .field("transcription_id", &self.transcription_id)
            .finish()
    }
}

/// A reference located inside a transcript and resolved by the linker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub text: String,
    pub url: String,
}

impl Citation {
    pub fn new(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: url.into(),
        }
    }
}

/// Result of the citation lookup. Its lifecycle is independent of `Session::status`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReferenceState {
    pub loading: bool,
    pub list: Option<Vec<Citation>>,
    pub error: Option<String>,
}

impl ReferenceState {
    pub fn loading() -> Self {
        Self {
            loading: true,
            list: None,
            error: None,
        }
    }

    pub fn loaded(list: Vec<Citation>) -> Self {
        Self {
            loading: false,
            list: Some(list),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            loading: false,
            list: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Session {
    pub status: Status,
    pub display_text: String,
    pub settings: Settings,
    pub references: ReferenceState,
    pub generation: Generation,
}
