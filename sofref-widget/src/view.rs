use serde::Serialize;
use sofref_core::types::{Citation, Session, Status};

pub const LOADING_NOTICE: &str = "Loading transcript...";
pub const ERROR_NOTICE: &str = "Whoops! Something went wrong.";
pub const REFERENCES_HEADING: &str = "References";
pub const REFERENCES_LOADING_NOTICE: &str = "Loading references...";
pub const NO_REFERENCES_NOTICE: &str = "No references found.";
pub const NO_SREF_NOTICE: &str = "No sref provided.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TranscriptPane {
    Empty,
    Loading,
    Failed,
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceLink {
    pub text: String,
    pub href: String,
}

impl ReferenceLink {
    pub fn from_citation(citation: &Citation, link_base_url: &str) -> Self {
        Self {
            text: citation.text.clone(),
            href: citation_href(link_base_url, &citation.url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ReferencePane {
    Hidden,
    Loading,
    Warning(String),
    List(Vec<ReferenceLink>),
}

/// Everything the rendering scope shows for one session snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewModel {
    pub transcript: TranscriptPane,
    pub references: ReferencePane,
    /// Last-applied transcription id, shown as the form's initial value.
    pub transcription_id: String,
    /// Small "Ref: <sref>" line under the plugin body; absent without an sref.
    pub ref_caption: Option<String>,
    pub sref_caption: String,
}

pub fn citation_href(link_base_url: &str, url: &str) -> String {
    format!(
        "{}/{}",
        link_base_url.trim_end_matches('/'),
        url.trim_start_matches('/')
    )
}

pub fn sref_caption(sref: Option<&str>) -> String {
    match sref.filter(|s| !s.is_empty()) {
        Some(sref) => format!("Current sref: {sref}"),
        None => NO_SREF_NOTICE.to_string(),
    }
}

pub fn ref_caption(sref: Option<&str>) -> Option<String> {
    sref.filter(|s| !s.is_empty()).map(|s| format!("Ref: {s}"))
}

pub fn render(session: &Session, sref: Option<&str>, link_base_url: &str) -> ViewModel {
    let transcript = match session.status {
        Status::Idle => TranscriptPane::Empty,
        Status::Loading => TranscriptPane::Loading,
        Status::Error => TranscriptPane::Failed,
        Status::Finished => TranscriptPane::Text(session.display_text.clone()),
    };

    let refs = &session.references;
    let references = if refs.loading {
        ReferencePane::Loading
    } else if let Some(error) = &refs.error {
        ReferencePane::Warning(error.clone())
    } else if let Some(list) = &refs.list {
        ReferencePane::List(
            list.iter()
                .map(|c| ReferenceLink::from_citation(c, link_base_url))
                .collect(),
        )
    } else {
        ReferencePane::Hidden
    };

    ViewModel {
        transcript,
        references,
        transcription_id: session.settings.transcription_id.clone(),
        ref_caption: ref_caption(sref),
        sref_caption: sref_caption(sref),
    }
}

impl std::fmt::Display for ViewModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.transcript {
            TranscriptPane::Empty => {}
            TranscriptPane::Loading => writeln!(f, "{LOADING_NOTICE}")?,
            TranscriptPane::Failed => writeln!(f, "{ERROR_NOTICE}")?,
            TranscriptPane::Text(text) => writeln!(f, "Ref: {text}")?,
        }

        match &self.references {
            ReferencePane::Hidden => {}
            ReferencePane::Loading => {
                writeln!(f, "{REFERENCES_HEADING}")?;
                writeln!(f, "  {REFERENCES_LOADING_NOTICE}")?;
            }
            ReferencePane::Warning(message) => {
                writeln!(f, "{REFERENCES_HEADING}")?;
                writeln!(f, "  ! {message}")?;
            }
            ReferencePane::List(links) if links.is_empty() => {
                writeln!(f, "{REFERENCES_HEADING}")?;
                writeln!(f, "  {NO_REFERENCES_NOTICE}")?;
            }
            ReferencePane::List(links) => {
                writeln!(f, "{REFERENCES_HEADING}")?;
                for link in links {
                    writeln!(f, "  - {} <{}>", link.text, link.href)?;
                }
            }
        }

        if let Some(caption) = &self.ref_caption {
            writeln!(f, "{caption}")?;
        }
        write!(f, "{}", self.sref_caption)
    }
}
