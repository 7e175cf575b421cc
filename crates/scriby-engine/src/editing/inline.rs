//! Structured inline model for a block's markup.
//!
//! Blocks persist their content as a small subset of HTML. Formatting
//! commands never edit that string directly: the markup is parsed into a
//! [`RichText`], the command is applied to its spans, and canonical markup is
//! written back.
//!
//! Understood tags: `b`/`strong`, `i`/`em`, `u`, `code`, `blockquote`, `pre`,
//! `input type="checkbox"` and `br`. Anything else is dropped, its text kept.
//!
//! Typing is different: [`replace_text`] splices the changed characters into
//! the existing markup, so tags the model does not understand (headings,
//! lists) survive plain text edits.

use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub code: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Code,
}

impl Marks {
    pub fn has(&self, mark: Mark) -> bool {
        match mark {
            Mark::Bold => self.bold,
            Mark::Italic => self.italic,
            Mark::Underline => self.underline,
            Mark::Code => self.code,
        }
    }

    pub fn set(&mut self, mark: Mark, on: bool) {
        match mark {
            Mark::Bold => self.bold = on,
            Mark::Italic => self.italic = on,
            Mark::Underline => self.underline = on,
            Mark::Code => self.code = on,
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == Marks::default()
    }
}

/// A run of text sharing the same marks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    pub text: String,
    pub marks: Marks,
}

/// Block-level wrapper around the inline content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlockStyle {
    #[default]
    Plain,
    Quote,
    Code,
}

/// Formatting commands offered by the editor toolbar and shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatCommand {
    Bold,
    Italic,
    Underline,
    InlineCode,
    Blockquote,
    CodeBlock,
    InsertCheckbox,
    ToggleCheckbox,
    ClearFormatting,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichText {
    pub style: BlockStyle,
    /// `Some(checked)` when the block starts with a checkbox
    pub checkbox: Option<bool>,
    spans: Vec<InlineSpan>,
}

#[derive(Default)]
struct Depths {
    bold: usize,
    italic: usize,
    underline: usize,
    code: usize,
}

impl Depths {
    fn marks(&self) -> Marks {
        Marks {
            bold: self.bold > 0,
            italic: self.italic > 0,
            underline: self.underline > 0,
            code: self.code > 0,
        }
    }
}

fn adjust(depth: &mut usize, closing: bool) {
    if closing {
        *depth = depth.saturating_sub(1);
    } else {
        *depth += 1;
    }
}

fn tag_regex() -> &'static Regex {
    static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    TAG_REGEX.get_or_init(|| {
        Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9]*)([^>]*)>").expect("Invalid tag regex")
    })
}

fn entity_regex() -> &'static Regex {
    static ENTITY_REGEX: OnceLock<Regex> = OnceLock::new();
    ENTITY_REGEX.get_or_init(|| Regex::new(r"^&#?[A-Za-z0-9]+;").expect("Invalid entity regex"))
}

/// Decode the text between two tags, keeping the byte range each character
/// came from. `offset` is where `raw` starts in the surrounding markup.
pub(crate) fn decode_run(raw: &str, offset: usize) -> Vec<(char, Range<usize>)> {
    let mut out = Vec::with_capacity(raw.len());
    let mut at = 0;
    while let Some(c) = raw[at..].chars().next() {
        let mut width = c.len_utf8();
        let mut decoded = c;
        if c == '&'
            && let Some(entity) = entity_regex().find(&raw[at..])
        {
            let text = html_escape::decode_html_entities(entity.as_str());
            let mut chars = text.chars();
            if let (Some(single), None) = (chars.next(), chars.next()) {
                decoded = single;
                width = entity.end();
            }
        }
        out.push((decoded, offset + at..offset + at + width));
        at += width;
    }
    out
}

/// Lengths of the common prefix and (non-overlapping) common suffix.
fn common_affixes(old: &[char], new: &[char]) -> (usize, usize) {
    let prefix = old.iter().zip(new).take_while(|(a, b)| a == b).count();
    let max_suffix = old.len().min(new.len()) - prefix;
    let suffix = old
        .iter()
        .rev()
        .zip(new.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();
    (prefix, suffix)
}

fn encode_text(text: &str) -> String {
    text.split('\n')
        .map(|line| html_escape::encode_text(line).into_owned())
        .collect::<Vec<_>>()
        .join("<br>")
}

/// Where typing goes in markup that has no text yet: after the leading
/// opening tags (and a checkbox's separating space).
fn empty_insertion_point(markup: &str) -> usize {
    let mut at = 0;
    for caps in tag_regex().captures_iter(markup) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if !caps[1].is_empty() || whole.start() != at {
            break;
        }
        at = whole.end();
    }
    if markup[at..].starts_with(' ') {
        at += 1;
    }
    at
}

/// Replace the visible text of `markup` with `text`, leaving every tag in
/// place.
///
/// Only the characters that differ are touched. Inserted characters land
/// inside the tags of the character before them, or of the character after
/// them at the start of the block. Returns `None` when the text is unchanged.
pub fn replace_text(markup: &str, text: &str) -> Option<String> {
    let (rich, positions) = RichText::parse_with_positions(markup);
    let old: Vec<char> = rich.plain_text().chars().collect();
    let new: Vec<char> = text.chars().collect();
    let (prefix, suffix) = common_affixes(&old, &new);
    if prefix == old.len() && prefix == new.len() {
        return None;
    }

    let insert_at = match prefix.checked_sub(1) {
        Some(before) => positions[before].end,
        None => positions
            .first()
            .map_or_else(|| empty_insertion_point(markup), |range| range.start),
    };
    let inserted: String = new[prefix..new.len() - suffix].iter().collect();

    let mut out = String::with_capacity(markup.len() + inserted.len());
    out.push_str(&markup[..insert_at]);
    out.push_str(&encode_text(&inserted));
    let mut last = insert_at;
    for removed in &positions[prefix..old.len() - suffix] {
        out.push_str(&markup[last..removed.start]);
        last = removed.end;
    }
    out.push_str(&markup[last..]);
    Some(out)
}

impl RichText {
    /// Plain text with no formatting
    pub fn plain(text: &str) -> Self {
        let mut rich = Self::default();
        rich.push_text(text, Marks::default());
        rich
    }

    pub fn parse(markup: &str) -> Self {
        Self::parse_with_positions(markup).0
    }

    /// Parse `markup`, also returning the byte range in `markup` of every
    /// character of the plain text.
    fn parse_with_positions(markup: &str) -> (Self, Vec<Range<usize>>) {
        let mut rich = Self::default();
        let mut positions = Vec::new();
        let mut depths = Depths::default();
        let mut after_checkbox = false;
        let mut last = 0;

        for caps in tag_regex().captures_iter(markup) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            rich.push_run(
                markup,
                last..whole.start(),
                depths.marks(),
                &mut after_checkbox,
                &mut positions,
            );
            last = whole.end();

            let closing = !caps[1].is_empty();
            let attrs = caps[3].to_ascii_lowercase();
            match caps[2].to_ascii_lowercase().as_str() {
                "b" | "strong" => adjust(&mut depths.bold, closing),
                "i" | "em" => adjust(&mut depths.italic, closing),
                "u" => adjust(&mut depths.underline, closing),
                "code" => adjust(&mut depths.code, closing),
                "blockquote" if !closing => rich.style = BlockStyle::Quote,
                "pre" if !closing => rich.style = BlockStyle::Code,
                "input" if attrs.contains("checkbox") => {
                    rich.checkbox = Some(attrs.contains("checked"));
                    after_checkbox = true;
                }
                "br" => {
                    rich.push_text("\n", depths.marks());
                    positions.push(whole.range());
                }
                _ => {}
            }
        }
        rich.push_run(
            markup,
            last..markup.len(),
            depths.marks(),
            &mut after_checkbox,
            &mut positions,
        );
        (rich, positions)
    }

    fn push_run(
        &mut self,
        markup: &str,
        run: Range<usize>,
        marks: Marks,
        after_checkbox: &mut bool,
        positions: &mut Vec<Range<usize>>,
    ) {
        if run.is_empty() {
            return;
        }
        let mut chars = decode_run(&markup[run.clone()], run.start).into_iter().peekable();
        if std::mem::take(after_checkbox) {
            chars.next_if(|(c, _)| *c == ' ');
        }
        let mut buf = [0u8; 4];
        for (c, range) in chars {
            self.push_text(c.encode_utf8(&mut buf), marks);
            positions.push(range);
        }
    }

    fn push_text(&mut self, text: &str, marks: Marks) {
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.marks == marks => last.text.push_str(text),
            _ => self.spans.push(InlineSpan {
                text: text.to_string(),
                marks,
            }),
        }
    }

    pub fn spans(&self) -> &[InlineSpan] {
        &self.spans
    }

    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn char_len(&self) -> usize {
        self.spans.iter().map(|s| s.text.chars().count()).sum()
    }

    fn chars(&self) -> Vec<(char, Marks)> {
        self.spans
            .iter()
            .flat_map(|span| span.text.chars().map(move |c| (c, span.marks)))
            .collect()
    }

    fn set_chars(&mut self, chars: impl IntoIterator<Item = (char, Marks)>) {
        self.spans.clear();
        let mut buf = [0u8; 4];
        for (c, marks) in chars {
            self.push_text(c.encode_utf8(&mut buf), marks);
        }
    }

    fn clamp(&self, range: Option<Range<usize>>) -> Range<usize> {
        let len = self.char_len();
        match range {
            Some(r) => {
                let end = r.end.min(len);
                r.start.min(end)..end
            }
            None => 0..len,
        }
    }

    /// Toggle `mark` over `range` (characters; `None` means the whole block).
    ///
    /// The mark is removed when every character in range already has it and
    /// added otherwise.
    pub fn toggle_mark(&mut self, mark: Mark, range: Option<Range<usize>>) -> bool {
        let range = self.clamp(range);
        if range.is_empty() {
            return false;
        }
        let mut chars = self.chars();
        let all_marked = chars[range.clone()].iter().all(|(_, m)| m.has(mark));
        for (_, marks) in &mut chars[range] {
            marks.set(mark, !all_marked);
        }
        self.set_chars(chars);
        true
    }

    /// Remove all inline marks over `range`.
    pub fn clear_marks(&mut self, range: Option<Range<usize>>) -> bool {
        let range = self.clamp(range);
        let mut chars = self.chars();
        if chars[range.clone()].iter().all(|(_, m)| m.is_plain()) {
            return false;
        }
        for (_, marks) in &mut chars[range] {
            *marks = Marks::default();
        }
        self.set_chars(chars);
        true
    }

    /// Apply a formatting command. Returns true when the content changed.
    pub fn apply(&mut self, command: FormatCommand, range: Option<Range<usize>>) -> bool {
        match command {
            FormatCommand::Bold => self.toggle_mark(Mark::Bold, range),
            FormatCommand::Italic => self.toggle_mark(Mark::Italic, range),
            FormatCommand::Underline => self.toggle_mark(Mark::Underline, range),
            FormatCommand::InlineCode => self.toggle_mark(Mark::Code, range),
            FormatCommand::Blockquote => self.toggle_style(BlockStyle::Quote),
            FormatCommand::CodeBlock => self.toggle_style(BlockStyle::Code),
            FormatCommand::InsertCheckbox => {
                if self.checkbox.is_some() {
                    return false;
                }
                self.checkbox = Some(false);
                true
            }
            FormatCommand::ToggleCheckbox => match self.checkbox {
                Some(checked) => {
                    self.checkbox = Some(!checked);
                    true
                }
                None => false,
            },
            FormatCommand::ClearFormatting => self.clear_marks(range),
        }
    }

    fn toggle_style(&mut self, style: BlockStyle) -> bool {
        self.style = if self.style == style {
            BlockStyle::Plain
        } else {
            style
        };
        true
    }

    /// Canonical markup for this content
    pub fn to_markup(&self) -> String {
        let mut inner = String::new();
        match self.checkbox {
            Some(true) => inner.push_str(r#"<input type="checkbox" checked /> "#),
            Some(false) => inner.push_str(r#"<input type="checkbox" /> "#),
            None => {}
        }

        for span in &self.spans {
            let tags: Vec<&str> = [
                (span.marks.bold, "b"),
                (span.marks.italic, "i"),
                (span.marks.underline, "u"),
                (span.marks.code, "code"),
            ]
            .into_iter()
            .filter_map(|(on, tag)| on.then_some(tag))
            .collect();

            for tag in &tags {
                inner.push_str(&format!("<{tag}>"));
            }
            inner.push_str(&encode_text(&span.text));
            for tag in tags.iter().rev() {
                inner.push_str(&format!("</{tag}>"));
            }
        }

        match self.style {
            BlockStyle::Plain => inner,
            BlockStyle::Quote => format!("<blockquote>{inner}</blockquote>"),
            BlockStyle::Code => format!("<pre>{inner}</pre>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn bold() -> Marks {
        Marks {
            bold: true,
            ..Marks::default()
        }
    }

    #[test]
    fn test_parse_marks_and_text() {
        let rich = RichText::parse("plain <b>bold <i>both</i></b> &amp; done");
        assert_eq!(rich.plain_text(), "plain bold both & done");
        assert_eq!(rich.spans().len(), 4);
        assert_eq!(rich.spans()[1].marks, bold());
        assert!(rich.spans()[2].marks.bold && rich.spans()[2].marks.italic);
        assert!(rich.spans()[3].marks.is_plain());
    }

    #[rstest]
    #[case("<strong>x</strong>", "<b>x</b>")]
    #[case("<em>x</em>", "<i>x</i>")]
    #[case("<B>x</B>", "<b>x</b>")]
    #[case("<span style=\"color:red\">x</span>", "x")]
    #[case("a<br>b", "a<br>b")]
    #[case("<blockquote>q</blockquote>", "<blockquote>q</blockquote>")]
    #[case("<pre>let x = 1 &lt; 2;</pre>", "<pre>let x = 1 &lt; 2;</pre>")]
    #[case("<input type=\"checkbox\" /> task", "<input type=\"checkbox\" /> task")]
    #[case("<input type=\"checkbox\" checked> done", "<input type=\"checkbox\" checked /> done")]
    #[case("<mark class=\"search-highlight\">hit</mark>", "hit")]
    fn test_canonical_markup(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(RichText::parse(input).to_markup(), expected);
    }

    #[test]
    fn test_parse_block_style_and_checkbox() {
        let rich = RichText::parse("<blockquote><input type=\"checkbox\" checked /> quoted</blockquote>");
        assert_eq!(rich.style, BlockStyle::Quote);
        assert_eq!(rich.checkbox, Some(true));
        assert_eq!(rich.plain_text(), "quoted");
    }

    #[test]
    fn test_toggle_bold_whole_block() {
        let mut rich = RichText::plain("hello");
        assert!(rich.apply(FormatCommand::Bold, None));
        assert_eq!(rich.to_markup(), "<b>hello</b>");
        assert!(rich.apply(FormatCommand::Bold, None));
        assert_eq!(rich.to_markup(), "hello");
    }

    #[test]
    fn test_toggle_mark_over_range() {
        let mut rich = RichText::plain("hello world");
        rich.toggle_mark(Mark::Italic, Some(6..11));
        assert_eq!(rich.to_markup(), "hello <i>world</i>");

        // Partially marked range gets the mark everywhere
        rich.toggle_mark(Mark::Italic, Some(4..8));
        assert_eq!(rich.to_markup(), "hell<i>o world</i>");
    }

    #[test]
    fn test_toggle_empty_range_is_noop() {
        let mut rich = RichText::plain("abc");
        assert!(!rich.toggle_mark(Mark::Bold, Some(2..2)));
        assert!(!RichText::default().toggle_mark(Mark::Bold, None));
    }

    #[test]
    fn test_range_is_clamped() {
        let mut rich = RichText::plain("abc");
        assert!(rich.toggle_mark(Mark::Underline, Some(1..99)));
        assert_eq!(rich.to_markup(), "a<u>bc</u>");
    }

    #[test]
    fn test_nested_tags_in_fixed_order() {
        let mut rich = RichText::parse("<u><b>x</b></u>");
        rich.toggle_mark(Mark::Code, None);
        assert_eq!(rich.to_markup(), "<b><u><code>x</code></u></b>");
    }

    #[test]
    fn test_clear_formatting_keeps_block_style() {
        let mut rich = RichText::parse("<blockquote><b>a</b><i>b</i></blockquote>");
        assert!(rich.apply(FormatCommand::ClearFormatting, None));
        assert_eq!(rich.to_markup(), "<blockquote>ab</blockquote>");
        assert!(!rich.apply(FormatCommand::ClearFormatting, None));
    }

    #[test]
    fn test_block_style_toggles() {
        let mut rich = RichText::plain("x");
        rich.apply(FormatCommand::Blockquote, None);
        assert_eq!(rich.style, BlockStyle::Quote);
        rich.apply(FormatCommand::CodeBlock, None);
        assert_eq!(rich.style, BlockStyle::Code);
        rich.apply(FormatCommand::CodeBlock, None);
        assert_eq!(rich.style, BlockStyle::Plain);
    }

    #[test]
    fn test_checkbox_commands() {
        let mut rich = RichText::plain("task");
        assert!(!rich.apply(FormatCommand::ToggleCheckbox, None));
        assert!(rich.apply(FormatCommand::InsertCheckbox, None));
        assert!(!rich.apply(FormatCommand::InsertCheckbox, None));
        assert!(rich.apply(FormatCommand::ToggleCheckbox, None));
        assert_eq!(rich.to_markup(), "<input type=\"checkbox\" checked /> task");
    }

    #[rstest]
    #[case("<b>bold</b> tail", "bolder tail", "<b>bolder</b> tail")]
    #[case("<b>bold</b> tail", "bold", "<b>bold</b>")]
    #[case("<i>word</i>", "a word", "<i>a word</i>")]
    #[case("", "new", "new")]
    #[case("new", "", "")]
    #[case("<h1>Title</h1><b>bold</b> text", "Title!bold text", "<h1>Title!</h1><b>bold</b> text")]
    #[case("<ul><li>one</li><li>two</li></ul>", "onetwo three", "<ul><li>one</li><li>two three</li></ul>")]
    #[case("<h2></h2>", "Heading", "<h2>Heading</h2>")]
    #[case(r#"<input type="checkbox" /> "#, "task", r#"<input type="checkbox" /> task"#)]
    #[case("a &amp; b", "a &amp b", "a &amp;amp b")]
    #[case("one<br>two", "one two", "one two")]
    #[case("x", "x\ny", "x<br>y")]
    fn test_replace_text_keeps_tags(
        #[case] markup: &str,
        #[case] text: &str,
        #[case] expected: &str,
    ) {
        let replaced = replace_text(markup, text).unwrap();
        assert_eq!(replaced, expected);
        assert_eq!(RichText::parse(&replaced).plain_text(), text);
    }

    #[test]
    fn test_replace_text_unchanged_is_none() {
        assert_eq!(replace_text("<b>same</b> &lt;3", "same <3"), None);
        assert_eq!(replace_text("", ""), None);
    }

    #[test]
    fn test_replace_text_deletion_across_tags_keeps_them_balanced() {
        let replaced = replace_text("a<b>bc</b>d", "ad").unwrap();
        assert_eq!(replaced, "a<b></b>d");
    }

    #[test]
    fn test_decode_run_tracks_entity_bytes() {
        let chars = decode_run("a&amp;é&bogus;", 10);
        let decoded: String = chars.iter().map(|(c, _)| *c).collect();
        assert_eq!(decoded, "a&é&bogus;");
        assert_eq!(chars[1].1, 11..16);
        assert_eq!(chars[2].1, 16..18);
    }

    #[test]
    fn test_text_is_escaped() {
        let rich = RichText::plain("a < b & c");
        assert_eq!(rich.to_markup(), "a &lt; b &amp; c");
        assert_eq!(RichText::parse(&rich.to_markup()).plain_text(), "a < b & c");
    }
}
