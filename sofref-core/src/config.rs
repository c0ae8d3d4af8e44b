use serde::{Deserialize, Serialize};

pub const DEFAULT_TRANSCRIPTION_BASE_URL: &str = "https://api.sofer.ai";
pub const DEFAULT_LINKER_BASE_URL: &str = "https://www.sefaria.org";
pub const DEFAULT_LINK_BASE_URL: &str = "https://www.sefaria.org";

/// Optional query parameters of the linker's `find-refs` endpoint.
///
/// Absent options are omitted from the query string entirely.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FindRefsOptions {
    /// Ask the linker to include the text of every citation.
    #[serde(default)]
    pub with_text: Option<bool>,
    #[serde(default)]
    pub debug: Option<bool>,
    /// Only meaningful together with `with_text`; 0 means no limit.
    #[serde(default)]
    pub max_segments: Option<u32>,
}

impl FindRefsOptions {
    pub fn debug() -> Self {
        Self {
            debug: Some(true),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    #[serde(default = "default_transcription_base_url")]
    pub transcription_base_url: String,
    #[serde(default = "default_linker_base_url")]
    pub linker_base_url: String,

    // Prefix for turning a citation's relative `url` into a browsable link.
    #[serde(default = "default_link_base_url")]
    pub link_base_url: String,

    #[serde(default = "FindRefsOptions::debug")]
    pub find_refs: FindRefsOptions,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            transcription_base_url: default_transcription_base_url(),
            linker_base_url: default_linker_base_url(),
            link_base_url: default_link_base_url(),
            find_refs: FindRefsOptions::debug(),
        }
    }
}

fn default_transcription_base_url() -> String {
    DEFAULT_TRANSCRIPTION_BASE_URL.into()
}

fn default_linker_base_url() -> String {
    DEFAULT_LINKER_BASE_URL.into()
}

fn default_link_base_url() -> String {
    DEFAULT_LINK_BASE_URL.into()
}
