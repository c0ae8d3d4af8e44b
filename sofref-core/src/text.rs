use regex::Regex;
use std::sync::OnceLock;

fn italic_span_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Non-greedy and `(?s)` so a span may cross line breaks but never swallows the
        // text between two separate spans.
        Regex::new(r"(?s)<i>.*?</i>").expect("valid italic span regex")
    })
}

/// Removes every `<i>...</i>` span (markers included) from a transcript.
///
/// Transcripts mark non-spoken annotations in italics; they are noise both for display
/// and for citation detection. Unmatched markers are left as-is.
pub fn remove_italics(text: &str) -> String {
    italic_span_re().replace_all(text, "").into_owned()
}
