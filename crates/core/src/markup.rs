//! # Markup Analysis
//!
//! Turns comment markdown into the inputs of the scoring rubric: the words a
//! reader sees and the HTML elements used to format them.
//!
//! Markdown is rendered with `pulldown-cmark`, which passes raw HTML through
//! unchanged. The rendered HTML is then read by a small tag scanner rather
//! than a full HTML parser. The scanner never fails; anything that does not
//! look like a tag is treated as text, and an element that is never closed
//! extends to the end of the document.

use std::collections::{BTreeMap, BTreeSet};

use lazy_static::lazy_static;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;

#[cfg(test)]
#[path = "markup_tests.rs"]
mod tests;

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: [&str; 8] = ["area", "br", "col", "hr", "img", "input", "meta", "wbr"];

lazy_static! {
    static ref TAG_REGEX: Regex = Regex::new(
        r"(?s)<!--.*?-->|<(/?)([A-Za-z][A-Za-z0-9-]*)([^<>]*)>"
    ).expect("Failed to compile tag regex");

    static ref ENTITY_REGEX: Regex = Regex::new(
        r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z]{2,8});"
    ).expect("Failed to compile entity regex");

    static ref URL_REGEX: Regex = Regex::new(
        r"(?i)\b(?:https?://|www\.)\S+"
    ).expect("Failed to compile URL regex");

    static ref WORD_REGEX: Regex = Regex::new(
        r"[\p{L}\p{N}_]+(?:['’-][\p{L}\p{N}_]+)*"
    ).expect("Failed to compile word regex");
}

/// A piece of scanned HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    /// Start tag, with the element name lower-cased
    Start { name: String, void: bool },
    End { name: String },
}

/// How often an element occurs and how many words it wraps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementStats {
    pub count: usize,
    pub words: usize,
}

/// Renders comment markdown to HTML.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

/// Splits HTML into text, start tags and end tags. HTML comments are dropped.
pub fn scan(html: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for captures in TAG_REGEX.captures_iter(html) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        if whole.start() > last {
            tokens.push(Token::Text(&html[last..whole.start()]));
        }
        last = whole.end();

        let Some(name) = captures.get(2) else {
            // HTML comment
            continue;
        };
        let name = name.as_str().to_ascii_lowercase();
        let closing = captures.get(1).is_some_and(|m| !m.as_str().is_empty());

        if closing {
            tokens.push(Token::End { name });
        } else {
            let attributes = captures.get(3).map_or("", |m| m.as_str());
            let void = attributes.trim_end().ends_with('/') || VOID_ELEMENTS.contains(&name.as_str());
            tokens.push(Token::Start { name, void });
        }
    }

    if last < html.len() {
        tokens.push(Token::Text(&html[last..]));
    }

    tokens
}

/// The text of `html` outside every element named in `disabled`.
///
/// Tags are replaced by spaces so text on either side of a tag never merges
/// into one word. Nested disabled elements are handled by depth counting.
pub fn visible_text(html: &str, disabled: &BTreeSet<String>) -> String {
    let mut text = String::with_capacity(html.len());
    let mut depth: BTreeMap<&str, usize> = BTreeMap::new();

    for token in scan(html) {
        match token {
            Token::Text(t) => {
                if depth.values().all(|d| *d == 0) {
                    text.push_str(t);
                }
            }
            Token::Start { name, void } => {
                if !void {
                    if let Some(element) = disabled.get(&name) {
                        *depth.entry(element.as_str()).or_default() += 1;
                    }
                }
                text.push(' ');
            }
            Token::End { name } => {
                if let Some(d) = depth.get_mut(name.as_str()) {
                    *d = d.saturating_sub(1);
                }
                text.push(' ');
            }
        }
    }

    text
}

/// Counts the start tags of each element in `elements` and the words inside
/// them. Element names are matched case-insensitively.
pub fn element_stats<'a, I>(html: &str, elements: I) -> BTreeMap<String, ElementStats>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut stats: BTreeMap<String, ElementStats> = elements
        .into_iter()
        .map(|e| (e.to_ascii_lowercase(), ElementStats::default()))
        .collect();
    let mut open: BTreeMap<String, usize> = BTreeMap::new();

    for token in scan(html) {
        match token {
            Token::Text(t) => {
                let words = tokenize(t).len();
                if words == 0 {
                    continue;
                }
                for (name, depth) in &open {
                    if *depth > 0 {
                        if let Some(s) = stats.get_mut(name) {
                            s.words += words;
                        }
                    }
                }
            }
            Token::Start { name, void } => {
                if let Some(s) = stats.get_mut(&name) {
                    s.count += 1;
                    if !void {
                        *open.entry(name).or_default() += 1;
                    }
                }
            }
            Token::End { name } => {
                if let Some(depth) = open.get_mut(&name) {
                    *depth = depth.saturating_sub(1);
                }
            }
        }
    }

    stats
}

/// Decodes named and numeric character references. Unknown or invalid
/// references are kept as written.
pub fn decode_entities(text: &str) -> String {
    ENTITY_REGEX
        .replace_all(text, |captures: &regex::Captures<'_>| {
            let reference = &captures[1];
            let decoded = if let Some(hex) = reference
                .strip_prefix("#x")
                .or_else(|| reference.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = reference.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match reference {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };

            decoded.map_or_else(|| captures[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

/// Splits text into the words that earn credit.
///
/// Character references are decoded and bare URLs removed first. A word is a
/// run of letters, digits or underscores; runs joined by an apostrophe or a
/// hyphen form a single word. Words keep their case.
pub fn tokenize(text: &str) -> Vec<String> {
    let decoded = decode_entities(text);
    let without_urls = URL_REGEX.replace_all(&decoded, " ");
    WORD_REGEX
        .find_iter(&without_urls)
        .map(|m| m.as_str().to_string())
        .collect()
}
