use sofref_core::types::Settings;
use sofref_engine::store::{FetchHandle, SessionStore};

/// Uncommitted edits of the two settings fields.
///
/// Edits live only here until [`SettingsForm::submit`] hands them to the store.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct SettingsForm {
    api_key: String,
    transcription_id: String,
}

impl std::fmt::Debug for SettingsForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsForm")
            .field("api_key", &"[REDACTED]")
            .field("transcription_id", &self.transcription_id)
            .finish()
    }
}

impl SettingsForm {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            transcription_id: settings.transcription_id.clone(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn transcription_id(&self) -> &str {
        &self.transcription_id
    }

    pub fn set_api_key(&mut self, value: impl Into<String>) {
        self.api_key = value.into();
    }

    pub fn set_transcription_id(&mut self, value: impl Into<String>) {
        self.transcription_id = value.into();
    }

    /// Applies the field values; always starts a new generation.
    pub fn submit(&self, store: &SessionStore) -> Option<FetchHandle> {
        store.update_settings_and_fetch(self.api_key.clone(), self.transcription_id.clone())
    }
}
