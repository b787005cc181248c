use std::sync::LazyLock;

use regex::Regex;

static REF_SELF_CLOSING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<ref\s[^>]+/>").unwrap());
static REF_PAIRED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<ref(?:\s[^>]+)?>.+?</ref>").unwrap());
static LINE_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<br ?/?>").unwrap());

/// Strip reference annotations from wikitext and turn `<br>` tags into
/// newlines. Everything else is left as written.
pub fn plain_text(wikitext: &str) -> String {
    let text = REF_SELF_CLOSING_RE.replace_all(wikitext, "");
    let text = REF_PAIRED_RE.replace_all(&text, "");
    LINE_BREAK_RE.replace_all(&text, "\n").into_owned()
}
