//! Substitution-only normalizers.
//!
//! Both work on the raw file text with an ordered chain of literal and regex
//! replacements. Order matters: later steps rely on the text earlier steps
//! leave behind.

use crate::config::Profile;
use crate::error::Result;
use crate::loader;
use crate::postprocess;
use crate::pretty;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static NAMED_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<a name="[^"]+"/>"#).expect("NAMED_ANCHOR: hardcoded regex is valid")
});

/// Evernote-style export markup to plain paragraphs and headings, before
/// pretty-printing.
pub fn simple_substitutions(html: &str, profile: &Profile) -> String {
    static BOLD_SPAN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"<span style="font-weight: bold;">([^<]+)</span>"#)
            .expect("BOLD_SPAN: hardcoded regex is valid")
    });
    static ITALIC_SPAN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"<span style="font-style: italic;">([^<]+)</span>"#)
            .expect("ITALIC_SPAN: hardcoded regex is valid")
    });

    let justify_attr = format!(" style=\"{}\"", profile.justify_style);
    let html = html.replace(&justify_attr, "");
    let html = html.replace("<li><div>", "<li>");
    let html = NAMED_ANCHOR.replace_all(&html, "");
    let html = html.replace("</div></li>", "</li>");

    let html = html.replace("<div><span>", "");
    let html = html.replace("</span>\n</div>", "");

    let html = html.replace("<div>\n<span><div>", "");
    let html = html.replace("</div></span>\n</div>", "");

    let html = html.replace("<div><br/></div>", "");
    let html = BOLD_SPAN.replace_all(&html, "<b>$1</b>");
    let html = ITALIC_SPAN.replace_all(&html, "<i>$1</i>");
    html.into_owned()
}

/// Full simple chain: substitutions, lenient parse, pretty-print, touch-ups.
/// `origin` names the input in parse errors.
pub fn normalize_simple(html: &str, profile: &Profile, origin: &Path) -> Result<String> {
    let substituted = simple_substitutions(html, profile);
    let dom = loader::parse_str(&substituted, profile.parse_mode, origin)?;
    let printed = pretty::print(&dom.document, profile);
    Ok(postprocess::simple_output(&printed))
}

/// Ordered list of question/answer items to `question`/`answer` paragraphs.
/// Each item is expected as `<li>Question<br/><i>Answer</i></li>`.
pub fn normalize_questions(html: &str) -> String {
    html.replace("<ol>", "")
        .replace("</ol>", "")
        .replace("  <li>", "<li>")
        .replace("<li>", "<p class=\"question\">")
        .replace("<br/><i>", "</p>\n  <p class=\"answer\">")
        .replace("</i></li>", "</p>")
}
