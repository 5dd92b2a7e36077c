//! Textual touch-ups on pretty-printed output.
//!
//! These run on the serialized string because they depend on the printer's
//! line layout, not on tree shape.

use crate::dom::trim_blank;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static LI_WRAPPED_P: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*<li>\s*\n\s*<p>\n(.*)\n\s*</p>\n\s*</li>")
        .expect("LI_WRAPPED_P: hardcoded regex is valid")
});

static LI_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<li>\n\s+").expect("LI_OPEN: hardcoded regex is valid"));
static LI_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*</li>").expect("LI_CLOSE: hardcoded regex is valid"));
static DIV_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<div>\n\s+").expect("DIV_OPEN: hardcoded regex is valid"));
static DIV_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*</div>").expect("DIV_CLOSE: hardcoded regex is valid"));
static HEADING_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<h(\d)>\n\s+").expect("HEADING_OPEN: hardcoded regex is valid")
});
static HEADING_CLOSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n\s+</h(\d)>").expect("HEADING_CLOSE: hardcoded regex is valid")
});
static NBSP_BETWEEN_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([\w,:)(])&nbsp;([\w,:)(])")
        .expect("NBSP_BETWEEN_WORDS: hardcoded regex is valid")
});

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Collapse `<li>` elements whose only content is one single-line paragraph
/// to `<li>Text</li>`, capitalizing the first letter.
pub fn reduce_list_items(html: &str) -> String {
    LI_WRAPPED_P
        .replace_all(html, |caps: &Captures| {
            format!("\n      <li>{}</li>", capitalize_first(trim_blank(&caps[1])))
        })
        .into_owned()
}

/// Post-processing of the tree normalizers.
pub fn tree_output(html: &str) -> String {
    reduce_list_items(html)
}

/// Post-processing of the substitution normalizer: pull list item, container
/// and heading content up against their tags, clean `&nbsp;` artifacts and put
/// a rule before every top-level heading.
pub fn simple_output(html: &str) -> String {
    let html = LI_OPEN.replace_all(html, "<li>");
    let html = LI_CLOSE.replace_all(&html, "</li>");

    let html = DIV_OPEN.replace_all(&html, "<p>");
    let html = DIV_CLOSE.replace_all(&html, "</p>");

    let html = HEADING_OPEN.replace_all(&html, "<h$1>");
    let html = HEADING_CLOSE.replace_all(&html, "</h$1>");
    let html = NBSP_BETWEEN_WORDS.replace_all(&html, "$1 $2");

    html.replace("&nbsp;=&nbsp;", " = ")
        .replace("&nbsp;<", "<")
        .replace("&nbsp; ", " ")
        .replace(">&nbsp;", ">")
        .replace("> ", ">")
        .replace(">&nbsp;", ">")
        .replace("<hr>", "<hr/>")
        .replace("<h1>", "<hr/>\n<h1>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_item_with_single_paragraph_is_collapsed_and_capitalized() {
        let html = "    <ul>\n      <li>\n        <p>\n          first item  \n        </p>\n      </li>\n    </ul>\n";
        assert_eq!(
            reduce_list_items(html),
            "    <ul>\n      <li>First item</li>\n    </ul>\n"
        );
    }

    #[test]
    fn multi_line_paragraphs_are_left_alone() {
        let html = "<li>\n  <p>\n    one\n    two\n  </p>\n</li>";
        assert_eq!(reduce_list_items(html), html);
    }

    #[test]
    fn capitalize_handles_non_ascii() {
        assert_eq!(capitalize_first("èra"), "Èra");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn simple_output_collapses_indentation() {
        let html = "<ul>\n  <li>\n    a\n  </li>\n</ul>\n<h2>\n  Title\n  </h2>\n<div>\n  text\n</div>";
        let out = simple_output(html);
        assert!(out.contains("<li>a</li>"));
        assert!(out.contains("<h2>Title</h2>"));
        assert!(out.contains("<p>text</p>"));
    }

    #[test]
    fn simple_output_normalizes_nbsp_and_rules_headings() {
        let out = simple_output("<h1>\n  Top\n  </h1>\n<p>a&nbsp;b x&nbsp;=&nbsp;y end&nbsp;</p><hr>");
        assert!(out.starts_with("<hr/>\n<h1>Top</h1>"));
        assert!(out.contains("a b"));
        assert!(out.contains("x = y"));
        assert!(out.contains("end</p>"));
        assert!(out.ends_with("<hr/>"));
    }
}
