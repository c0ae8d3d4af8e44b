use crate::request::{Body, HttpRequest, join_url};
use serde::Serialize;
use serde_json::json;
use sofref_core::config::FindRefsOptions;

pub const FIND_REFS_PATH: &str = "/api/find-refs";

/// Input document for the linker.
///
/// Citations found in `title` are used as context for the ones in `body`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LinkerText {
    pub title: String,
    pub body: String,
}

impl LinkerText {
    pub fn body_only(body: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            body: body.into(),
        }
    }
}

fn flag(v: bool) -> &'static str {
    if v { "1" } else { "0" }
}

fn query_string(opts: &FindRefsOptions) -> String {
    let mut q = url::form_urlencoded::Serializer::new(String::new());
    if let Some(v) = opts.with_text {
        q.append_pair("with_text", flag(v));
    }
    if let Some(v) = opts.debug {
        q.append_pair("debug", flag(v));
    }
    if let Some(v) = opts.max_segments {
        q.append_pair("max_segments", &v.to_string());
    }
    q.finish()
}

pub fn build_find_refs_request(
    base_url: &str,
    text: &LinkerText,
    opts: &FindRefsOptions,
) -> HttpRequest {
    let mut url = join_url(base_url, FIND_REFS_PATH);
    let query = query_string(opts);
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query);
    }

    // The endpoint expects the document wrapped in a `text` field.
    let payload = json!({ "text": text });

    HttpRequest {
        method: "POST".into(),
        url,
        headers: vec![("Content-Type".into(), "application/json".into())],
        body: Body::Json(payload.to_string()),
    }
}
