//! Best-effort markup to Markdown conversion for exporting a page.
//!
//! This is an ordered list of pattern substitutions, not a parser: nested or
//! unusual markup degrades to plain text once the final pass strips every
//! remaining tag.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::models::Page;

pub const DEFAULT_EXPORT_NAME: &str = "scriby-note";
pub const EXPORT_EXTENSION: &str = "md";

enum Replacement {
    Template(&'static str),
    List { ordered: bool },
}

struct Rule {
    pattern: &'static str,
    replacement: Replacement,
}

const RULES: &[Rule] = &[
    Rule {
        pattern: r"(?i)<h1>(.*?)</h1>",
        replacement: Replacement::Template("# $1\n"),
    },
    Rule {
        pattern: r"(?i)<h2>(.*?)</h2>",
        replacement: Replacement::Template("## $1\n"),
    },
    Rule {
        pattern: r"(?i)<b>(.*?)</b>",
        replacement: Replacement::Template("**$1**"),
    },
    Rule {
        pattern: r"(?i)<strong>(.*?)</strong>",
        replacement: Replacement::Template("**$1**"),
    },
    Rule {
        pattern: r"(?i)<i>(.*?)</i>",
        replacement: Replacement::Template("*$1*"),
    },
    Rule {
        pattern: r"(?i)<em>(.*?)</em>",
        replacement: Replacement::Template("*$1*"),
    },
    Rule {
        pattern: r"(?i)<u>(.*?)</u>",
        replacement: Replacement::Template("_${1}_"),
    },
    Rule {
        pattern: r"(?i)<code>(.*?)</code>",
        replacement: Replacement::Template("`$1`"),
    },
    Rule {
        pattern: r"(?is)<ul>(.*?)</ul>",
        replacement: Replacement::List { ordered: false },
    },
    Rule {
        pattern: r"(?is)<ol>(.*?)</ol>",
        replacement: Replacement::List { ordered: true },
    },
    Rule {
        pattern: r"(?i)<pre>(.*?)</pre>",
        replacement: Replacement::Template("```\n$1\n```"),
    },
    Rule {
        pattern: r"(?i)<blockquote>(.*?)</blockquote>",
        replacement: Replacement::Template("> $1"),
    },
    Rule {
        pattern: r#"(?i)<input[^>]*checkbox[^>]*checked[^>]*>\s?"#,
        replacement: Replacement::Template("[x] "),
    },
    Rule {
        pattern: r#"(?i)<input[^>]*checkbox[^>]*>\s?"#,
        replacement: Replacement::Template("[ ] "),
    },
    Rule {
        pattern: r"(?i)<br\s*/?>",
        replacement: Replacement::Template("\n"),
    },
    Rule {
        pattern: r"<[^>]+>",
        replacement: Replacement::Template(""),
    },
];

fn compiled_rules() -> &'static [Regex] {
    static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        RULES
            .iter()
            .map(|rule| Regex::new(rule.pattern).expect("Invalid export regex"))
            .collect()
    })
}

fn list_item_regex() -> &'static Regex {
    static LIST_ITEM: OnceLock<Regex> = OnceLock::new();
    LIST_ITEM.get_or_init(|| Regex::new(r"(?i)<li>(.*?)</li>").expect("Invalid list item regex"))
}

fn render_list(items: &str, ordered: bool) -> String {
    list_item_regex()
        .captures_iter(items)
        .enumerate()
        .map(|(i, caps)| {
            if ordered {
                format!("{}. {}\n", i + 1, &caps[1])
            } else {
                format!("- {}\n", &caps[1])
            }
        })
        .collect()
}

/// Convert block markup to Markdown text.
pub fn markup_to_markdown(markup: &str) -> String {
    let mut text = markup.to_string();
    for (rule, regex) in RULES.iter().zip(compiled_rules()) {
        text = match rule.replacement {
            Replacement::Template(template) => regex.replace_all(&text, template).into_owned(),
            Replacement::List { ordered } => regex
                .replace_all(&text, |caps: &Captures| render_list(&caps[1], ordered))
                .into_owned(),
        };
    }
    html_escape::decode_html_entities(&text).into_owned()
}

/// Markdown for a page's flattened content
pub fn page_to_markdown(page: &Page) -> String {
    markup_to_markdown(&page.content)
}

/// File name for an exported page: its title, or a default when blank.
pub fn export_filename(title: &str) -> String {
    let trimmed = title.trim();
    let stem = if trimmed.is_empty() {
        DEFAULT_EXPORT_NAME.to_string()
    } else {
        trimmed.replace(['/', '\\'], "-")
    };
    format!("{stem}.{EXPORT_EXTENSION}")
}
