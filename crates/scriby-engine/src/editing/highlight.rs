use regex::{Regex, RegexBuilder};
use std::ops::Range;
use std::sync::OnceLock;

use crate::editing::inline::decode_run;

pub const HIGHLIGHT_OPEN: &str = r#"<mark class="search-highlight">"#;
pub const HIGHLIGHT_CLOSE: &str = "</mark>";

fn marker_regex() -> &'static Regex {
    static MARKER_REGEX: OnceLock<Regex> = OnceLock::new();
    MARKER_REGEX.get_or_init(|| {
        Regex::new(r#"<mark class="search-highlight">|</mark>"#).expect("Invalid marker regex")
    })
}

/// Search never matches inside a tag.
fn tag_regex() -> &'static Regex {
    static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    TAG_REGEX.get_or_init(|| Regex::new(r"<[^>]*>").expect("Invalid markup regex"))
}

/// Remove every highlight marker from `markup`.
pub fn strip_highlights(markup: &str) -> String {
    marker_regex().replace_all(markup, "").into_owned()
}

/// Wrap each case-insensitive literal occurrence of `query` in a highlight
/// marker.
///
/// Text is matched after decoding character entities, so `&` finds `&amp;`
/// while `amp` does not. Markers from an earlier call are stripped first, so
/// applying the same query twice gives the same result as applying it once.
/// A blank query only strips.
pub fn highlight(markup: &str, query: &str) -> String {
    let clean = strip_highlights(markup);
    let Some(pattern) = search_pattern(query) else {
        return clean;
    };

    let mut out = String::with_capacity(clean.len());
    let mut last = 0;
    for tag in tag_regex().find_iter(&clean) {
        out.push_str(&wrap_matches(&clean[last..tag.start()], &pattern));
        out.push_str(tag.as_str());
        last = tag.end();
    }
    out.push_str(&wrap_matches(&clean[last..], &pattern));
    out
}

/// Character ranges of each case-insensitive occurrence of `query` in plain
/// `text`. Used by front ends that draw highlights themselves.
pub fn find_matches(text: &str, query: &str) -> Vec<Range<usize>> {
    let Some(pattern) = search_pattern(query) else {
        return Vec::new();
    };
    let char_at = |byte: usize| text[..byte].chars().count();
    pattern
        .find_iter(text)
        .map(|m| char_at(m.start())..char_at(m.end()))
        .collect()
}

fn search_pattern(query: &str) -> Option<Regex> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    match RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    {
        Ok(pattern) => Some(pattern),
        Err(e) => {
            log::warn!("Could not build search pattern for {query:?}: {e}");
            None
        }
    }
}

/// Wrap matches in a run of markup text, matching against the decoded text
/// and wrapping the raw source of each hit.
fn wrap_matches(raw: &str, pattern: &Regex) -> String {
    let chars = decode_run(raw, 0);
    let mut decoded = String::with_capacity(raw.len());
    // (offset in decoded, offset in raw) at each character boundary
    let mut bounds = Vec::with_capacity(chars.len() + 1);
    for (c, range) in &chars {
        bounds.push((decoded.len(), range.start));
        decoded.push(*c);
    }
    bounds.push((decoded.len(), raw.len()));
    let raw_at = |offset: usize| {
        bounds
            .binary_search_by_key(&offset, |(decoded_at, _)| *decoded_at)
            .map_or(raw.len(), |i| bounds[i].1)
    };

    let mut out = String::with_capacity(raw.len());
    let mut last = 0;
    for hit in pattern.find_iter(&decoded) {
        let (start, end) = (raw_at(hit.start()), raw_at(hit.end()));
        out.push_str(&raw[last..start]);
        out.push_str(HIGHLIGHT_OPEN);
        out.push_str(&raw[start..end]);
        out.push_str(HIGHLIGHT_CLOSE);
        last = end;
    }
    out.push_str(&raw[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::inline::RichText;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_highlight_is_case_insensitive() {
        assert_eq!(
            highlight("Hello hello", "HELLO"),
            r#"<mark class="search-highlight">Hello</mark> <mark class="search-highlight">hello</mark>"#
        );
    }

    #[rstest]
    #[case("plain text", "text")]
    #[case("<b>bold</b> words", "o")]
    #[case("a.b.c", ".")]
    #[case("", "x")]
    fn test_highlight_is_idempotent(#[case] markup: &str, #[case] query: &str) {
        let once = highlight(markup, query);
        let twice = highlight(&once, query);
        assert_eq!(once, twice);
    }

    #[rstest]
    #[case("plain text", "text")]
    #[case("<i>mark</i> me", "mark")]
    #[case("x &amp; y", "amp")]
    fn test_blank_query_restores_original(#[case] markup: &str, #[case] query: &str) {
        let marked = highlight(markup, query);
        assert_eq!(highlight(&marked, ""), markup);
        assert_eq!(highlight(&marked, "   "), markup);
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert_eq!(
            highlight("a+b ab", "a+b"),
            r#"<mark class="search-highlight">a+b</mark> ab"#
        );
        assert_eq!(highlight("abc", ".*"), "abc");
    }

    #[test]
    fn test_tags_and_entities_are_never_matched() {
        assert_eq!(
            highlight("<b>b</b>", "b"),
            r#"<b><mark class="search-highlight">b</mark></b>"#
        );
        assert_eq!(highlight("&amp;", "amp"), "&amp;");
    }

    #[rstest]
    #[case("a &amp; b", "&", r#"a <mark class="search-highlight">&amp;</mark> b"#)]
    #[case("1 &lt; 2", "< 2", r#"1 <mark class="search-highlight">&lt; 2</mark>"#)]
    #[case("caf&eacute; CAFÉ", "café", r#"<mark class="search-highlight">caf&eacute;</mark> <mark class="search-highlight">CAFÉ</mark>"#)]
    fn test_entities_match_their_decoded_text(
        #[case] markup: &str,
        #[case] query: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(highlight(markup, query), expected);
        assert_eq!(highlight(expected, ""), markup);
    }

    #[test]
    fn test_markup_and_plain_text_highlights_agree() {
        let markup = "x &gt; y &amp; z";
        let plain = RichText::parse(markup).plain_text();
        assert_eq!(find_matches(&plain, "&"), vec![6..7]);
        assert_eq!(
            highlight(markup, "&"),
            r#"x &gt; y <mark class="search-highlight">&amp;</mark> z"#
        );
    }

    #[test]
    fn test_query_is_trimmed() {
        assert_eq!(
            highlight("find me", "  me "),
            r#"find <mark class="search-highlight">me</mark>"#
        );
    }

    #[rstest]
    #[case("Hello hello", "LO", vec![3..5, 9..11])]
    #[case("naïve café", "café", vec![6..10])]
    #[case("anything", "  ", vec![])]
    #[case("a.b", ".", vec![1..2])]
    fn test_find_matches(
        #[case] text: &str,
        #[case] query: &str,
        #[case] expected: Vec<Range<usize>>,
    ) {
        assert_eq!(find_matches(text, query), expected);
    }
}
