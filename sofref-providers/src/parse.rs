use anyhow::Context;
use indexmap::IndexMap;
use serde::Deserialize;
use sofref_core::types::Citation;

#[derive(Debug, Deserialize)]
pub struct TranscriptionResponse {
    pub text: String,
}

pub fn parse_transcription(body: &[u8]) -> anyhow::Result<String> {
    let resp: TranscriptionResponse =
        serde_json::from_slice(body).context("decode transcription JSON")?;
    Ok(resp.text)
}

/// One located citation inside the submitted text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationResult {
    #[serde(default)]
    pub start_char: usize,
    #[serde(default)]
    pub end_char: usize,
    #[serde(default)]
    pub text: String,
    /// The citation was recognised but could not be resolved to a source.
    #[serde(default)]
    pub link_failed: bool,
    /// More than one entry means the citation was ambiguous.
    #[serde(default)]
    pub refs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefDataDetail {
    /// Relative link; the only field the plugin relies on.
    pub url: String,
    #[serde(default)]
    pub he_ref: Option<String>,
    #[serde(default)]
    pub primary_category: Option<String>,
    #[serde(default)]
    pub he: Option<Vec<String>>,
    #[serde(default)]
    pub en: Option<Vec<String>>,
    #[serde(default)]
    pub is_truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindRefsSection {
    #[serde(default)]
    pub results: Vec<CitationResult>,
    // Keyed by ref; order matters because it drives the order of the rendered list.
    pub ref_data: IndexMap<String, RefDataDetail>,
    #[serde(default)]
    pub debug_data: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FindRefsResponse {
    #[serde(default)]
    pub title: Option<FindRefsSection>,
    pub body: FindRefsSection,
}

impl FindRefsResponse {
    pub fn body_citations(&self) -> Vec<Citation> {
        self.body
            .ref_data
            .iter()
            .map(|(text, detail)| Citation::new(text.clone(), detail.url.clone()))
            .collect()
    }
}

pub fn parse_find_refs(body: &[u8]) -> anyhow::Result<FindRefsResponse> {
    serde_json::from_slice(body).context("decode find-refs JSON")
}
