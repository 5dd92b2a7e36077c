//! E-book target profile.
//!
//! Every value a pass or the printer depends on lives here, so tests and
//! alternate targets can swap them without touching the passes.

/// How the Tree Loader reads its input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseMode {
    /// Well-formed XML/XHTML; any parse error aborts the run.
    Strict,
    /// Real-world HTML: unclosed tags and implied structure are tolerated.
    Lenient,
}

#[derive(Clone, Debug)]
pub struct Profile {
    pub parse_mode: ParseMode,
    /// Maximum line width for wrapped inline content.
    pub wrap: usize,
    /// Spaces per indentation level.
    pub indent: usize,
    pub doctype: String,
    /// Write void elements as `<br/>` instead of `<br>`.
    pub self_close_void: bool,
    pub bold_style: String,
    pub italic_style: String,
    pub justify_style: String,
    /// Applied in order to every text node.
    pub glyph_substitutions: Vec<(char, char)>,
    /// Class marking an anchor as a footnote reference.
    pub footnote_class: String,
    pub stylesheet_href: String,
    pub xhtml_namespace: String,
    pub epub_namespace: String,
}

impl Default for Profile {
    fn default() -> Self {
        Profile {
            parse_mode: ParseMode::Strict,
            wrap: 200,
            indent: 2,
            doctype: "<!DOCTYPE html>".to_string(),
            self_close_void: true,
            bold_style: "font-weight: bold;".to_string(),
            italic_style: "font-style: italic;".to_string(),
            justify_style: "text-align:justify;".to_string(),
            glyph_substitutions: vec![('ù', '§')],
            footnote_class: "sdfootnoteanc".to_string(),
            stylesheet_href: "../Styles/Style0001.css".to_string(),
            xhtml_namespace: "http://www.w3.org/1999/xhtml".to_string(),
            epub_namespace: "http://www.idpf.org/2007/ops".to_string(),
        }
    }
}

impl Profile {
    /// Generic normalizer: input is already well-formed.
    pub fn html() -> Self {
        Profile::default()
    }

    /// Word-processor export: lenient HTML.
    pub fn odt() -> Self {
        Profile {
            parse_mode: ParseMode::Lenient,
            ..Profile::default()
        }
    }

    /// Evernote-style export run through the substitution chain.
    pub fn simple() -> Self {
        Profile {
            parse_mode: ParseMode::Lenient,
            wrap: 90,
            ..Profile::default()
        }
    }

    pub fn with_parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = mode;
        self
    }

    pub fn with_wrap(mut self, wrap: usize) -> Self {
        self.wrap = wrap;
        self
    }
}
