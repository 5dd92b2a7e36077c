//! Pretty Printer: RcDom → indented XHTML string.
//!
//! Layout rules:
//!   • Block elements open and close on their own lines; their content sits one
//!     indentation level deeper.
//!   • Runs of text and inline elements are whitespace-collapsed, then greedily
//!     wrapped at `Profile::wrap` columns (indent included). Breaks only happen at
//!     whitespace that was in the source, never inside a tag.
//!   • <br> ends the current line of its run.
//!   • <title> keeps its content on the tag line; <pre>, <script> and <style> are
//!     copied without reflow.
//!   • Void elements never get an end tag; with `self_close_void` they are written
//!     as `<br/>`.

use crate::config::Profile;
use crate::dom;
use html5ever::QualName;
use markup5ever_rcdom::{Handle, NodeData};

/* =============================== Core sets =============================== */

fn is_inline(name: &str) -> bool {
    matches!(
        name,
        "a" | "abbr" | "b" | "bdi" | "bdo" | "br" | "cite" | "code" | "data" | "del" | "dfn"
            | "em" | "font" | "i" | "img" | "ins" | "kbd" | "label" | "mark" | "q" | "s"
            | "samp" | "small" | "span" | "strike" | "strong" | "sub" | "sup" | "time" | "tt"
            | "u" | "var" | "wbr"
    )
}

fn is_void(name: &str) -> bool {
    matches!(
        name,
        "area" | "base" | "basefont" | "br" | "col" | "embed" | "hr" | "img" | "input"
            | "link" | "meta" | "param" | "source" | "track" | "wbr"
    )
}

fn is_verbatim(name: &str) -> bool {
    matches!(name, "pre" | "script" | "style")
}

/// Raw-text elements: content is written unescaped.
fn is_raw_text(name: &str) -> bool {
    matches!(name, "script" | "style")
}

fn is_compact(name: &str) -> bool {
    name == "title"
}

/* ================================ Escaping =============================== */

fn escape_text(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr(s: &str, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

/* ============================== Inline runs ============================== */

/// Words of a run of inline content, split into hard lines at <br>.
/// A word is a maximal stretch without source whitespace; tags glue to the
/// text around them.
#[derive(Default)]
struct InlineRun {
    lines: Vec<Vec<String>>,
    word: String,
}

impl InlineRun {
    fn push_text(&mut self, text: &str) {
        for ch in text.chars() {
            if matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0C') {
                self.break_word();
            } else {
                let mut buf = String::new();
                escape_text(ch.encode_utf8(&mut [0; 4]), &mut buf);
                self.word.push_str(&buf);
            }
        }
    }

    fn push_markup(&mut self, markup: &str) {
        self.word.push_str(markup);
    }

    fn break_word(&mut self) {
        if self.word.is_empty() {
            return;
        }
        let word = std::mem::take(&mut self.word);
        match self.lines.last_mut() {
            Some(line) => line.push(word),
            None => self.lines.push(vec![word]),
        }
    }

    fn hard_break(&mut self) {
        self.break_word();
        self.lines.push(Vec::new());
    }

    fn is_empty(&self) -> bool {
        self.word.is_empty() && self.lines.iter().all(Vec::is_empty)
    }

    fn finish(mut self) -> Vec<Vec<String>> {
        self.break_word();
        self.lines.retain(|l| !l.is_empty());
        self.lines
    }
}

/// Greedy fill of `words` into lines of at most `width` chars. A single word
/// longer than `width` gets a line of its own.
fn fill(words: &[String], width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    for word in words {
        let len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = len;
        } else if current_len + 1 + len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = len;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/* ============================== Namespaces =============================== */

fn element_name(node: &Handle) -> Option<&QualName> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name),
        _ => None,
    }
}

/// Prefixes used by elements and attributes of the subtree, in document
/// order, with the namespace each one is bound to. `xml` and `xmlns` are
/// predeclared and never listed.
fn used_prefixes(root: &Handle) -> Vec<(String, String)> {
    let mut found: Vec<(String, String)> = Vec::new();
    let mut note = |name: &QualName| {
        let Some(prefix) = &name.prefix else {
            return;
        };
        let prefix = &**prefix;
        if prefix == "xml" || prefix == "xmlns" || name.ns.is_empty() {
            return;
        }
        if !found.iter().any(|(p, _)| p == prefix) {
            found.push((prefix.to_string(), name.ns.to_string()));
        }
    };
    for node in std::iter::once(root.clone()).chain(dom::descendants(root)) {
        if let NodeData::Element { name, attrs, .. } = &node.data {
            note(name);
            for attr in attrs.borrow().iter() {
                note(&attr.name);
            }
        }
    }
    found
}

/// `xmlns` declarations `node` needs beyond its own attributes. The strict
/// loader turns declarations into element namespaces, so they are rebuilt
/// here: the root declares its default namespace and every prefix in use,
/// and a nested element outside the XHTML namespace declares its own.
fn namespace_declarations(node: &Handle, root: bool) -> Vec<(String, String)> {
    let Some(name) = element_name(node) else {
        return Vec::new();
    };
    let mut declared = Vec::new();
    if root {
        if name.prefix.is_none() && !name.ns.is_empty() && !dom::has_attr(node, "xmlns") {
            declared.push(("xmlns".to_string(), name.ns.to_string()));
        }
        for (prefix, ns) in used_prefixes(node) {
            let attr = format!("xmlns:{prefix}");
            if !dom::has_attr(node, &attr) {
                declared.push((attr, ns));
            }
        }
    } else if name.prefix.is_none()
        && !name.ns.is_empty()
        && &*name.ns != dom::HTML_NS
        && !dom::has_attr(node, "xmlns")
    {
        let parent_ns = dom::parent(node)
            .and_then(|p| element_name(&p).map(|n| n.ns.to_string()));
        if parent_ns.as_deref() != Some(&*name.ns) {
            declared.push(("xmlns".to_string(), name.ns.to_string()));
        }
    }
    declared
}

/* ================================ Printer ================================ */

pub struct PrettyPrinter<'a> {
    profile: &'a Profile,
}

impl<'a> PrettyPrinter<'a> {
    pub fn new(profile: &'a Profile) -> Self {
        PrettyPrinter { profile }
    }

    /// Serialize a document node (or any subtree root) with the doctype line first.
    pub fn print_document(&self, document: &Handle) -> String {
        let mut out = String::with_capacity(4096);
        out.push_str(&self.profile.doctype);
        out.push('\n');
        for child in dom::children(document) {
            match &child.data {
                NodeData::Element { .. } => self.write_block(&child, 0, &mut out),
                NodeData::Comment { contents } => {
                    out.push_str("<!--");
                    out.push_str(contents);
                    out.push_str("-->\n");
                }
                _ => {}
            }
        }
        out
    }

    fn indent(&self, depth: usize, out: &mut String) {
        out.extend(std::iter::repeat(' ').take(depth * self.profile.indent));
    }

    fn start_tag(&self, node: &Handle, root: bool, out: &mut String) {
        let NodeData::Element { name, .. } = &node.data else {
            return;
        };
        let tag = dom::qualified_name(name);
        out.push('<');
        out.push_str(&tag);
        let declared = namespace_declarations(node, root);
        for (attr_name, value) in dom::attributes(node).into_iter().chain(declared) {
            out.push(' ');
            out.push_str(&attr_name);
            out.push_str("=\"");
            escape_attr(&value, out);
            out.push('"');
        }
        if is_void(&name.local) && self.profile.self_close_void {
            out.push('/');
        }
        out.push('>');
    }

    fn end_tag(&self, node: &Handle, out: &mut String) {
        if let NodeData::Element { name, .. } = &node.data {
            out.push_str("</");
            out.push_str(&dom::qualified_name(name));
            out.push('>');
        }
    }

    fn write_block(&self, node: &Handle, depth: usize, out: &mut String) {
        let Some(name) = dom::tag_name(node) else {
            return;
        };

        if is_void(name) {
            self.indent(depth, out);
            self.start_tag(node, depth == 0, out);
            out.push('\n');
            return;
        }

        if is_verbatim(name) {
            self.indent(depth, out);
            self.start_tag(node, depth == 0, out);
            self.write_verbatim_children(node, is_raw_text(name), out);
            self.end_tag(node, out);
            out.push('\n');
            return;
        }

        if is_compact(name) {
            let mut run = InlineRun::default();
            for child in dom::children(node) {
                self.push_inline(&child, &mut run);
            }
            self.indent(depth, out);
            self.start_tag(node, depth == 0, out);
            let words: Vec<String> = run.finish().into_iter().flatten().collect();
            out.push_str(&words.join(" "));
            self.end_tag(node, out);
            out.push('\n');
            return;
        }

        let mut body = String::new();
        let mut run = InlineRun::default();
        for child in dom::children(node) {
            let block_child = dom::tag_name(&child).is_some_and(|t| !is_inline(t));
            if block_child {
                let pending = std::mem::take(&mut run);
                self.flush_run(pending, depth + 1, &mut body);
                self.write_block(&child, depth + 1, &mut body);
            } else {
                self.push_inline(&child, &mut run);
            }
        }
        self.flush_run(run, depth + 1, &mut body);

        self.indent(depth, out);
        self.start_tag(node, depth == 0, out);
        if body.is_empty() {
            self.end_tag(node, out);
            out.push('\n');
            return;
        }
        out.push('\n');
        out.push_str(&body);
        self.indent(depth, out);
        self.end_tag(node, out);
        out.push('\n');
    }

    fn flush_run(&self, run: InlineRun, depth: usize, out: &mut String) {
        if run.is_empty() {
            return;
        }
        let width = self
            .profile
            .wrap
            .saturating_sub(depth * self.profile.indent)
            .max(1);
        for hard_line in run.finish() {
            for line in fill(&hard_line, width) {
                self.indent(depth, out);
                out.push_str(&line);
                out.push('\n');
            }
        }
    }

    fn push_inline(&self, node: &Handle, run: &mut InlineRun) {
        match &node.data {
            NodeData::Text { contents } => run.push_text(&contents.borrow()),
            NodeData::Comment { contents } => {
                run.push_markup("<!--");
                run.push_markup(contents);
                run.push_markup("-->");
            }
            NodeData::Element { name, .. } => {
                let mut tag = String::new();
                self.start_tag(node, false, &mut tag);
                run.push_markup(&tag);
                if is_void(&name.local) {
                    if &*name.local == "br" {
                        run.hard_break();
                    }
                    return;
                }
                for child in dom::children(node) {
                    self.push_inline(&child, run);
                }
                let mut end = String::new();
                self.end_tag(node, &mut end);
                run.push_markup(&end);
            }
            _ => {}
        }
    }

    fn write_verbatim_children(&self, node: &Handle, raw: bool, out: &mut String) {
        for child in dom::children(node) {
            match &child.data {
                NodeData::Text { contents } => {
                    if raw {
                        out.push_str(&contents.borrow());
                    } else {
                        escape_text(&contents.borrow(), out);
                    }
                }
                NodeData::Element { .. } => {
                    self.start_tag(&child, false, out);
                    if !dom::tag_name(&child).is_some_and(is_void) {
                        self.write_verbatim_children(&child, raw, out);
                        self.end_tag(&child, out);
                    }
                }
                NodeData::Comment { contents } => {
                    out.push_str("<!--");
                    out.push_str(contents);
                    out.push_str("-->");
                }
                _ => {}
            }
        }
    }
}

/// Convenience wrapper: print `document` with `profile`.
pub fn print(document: &Handle, profile: &Profile) -> String {
    PrettyPrinter::new(profile).print_document(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseMode;
    use crate::loader::parse_str;
    use markup5ever_rcdom::RcDom;
    use std::path::Path;

    fn parse(src: &str, mode: ParseMode) -> RcDom {
        parse_str(src, mode, Path::new("fixture.html")).unwrap()
    }

    fn reparses_strictly(out: &str) -> bool {
        parse_str(out, ParseMode::Strict, Path::new("out.xhtml")).is_ok()
    }

    fn pretty(src: &str, wrap: usize) -> String {
        let dom = parse(src, ParseMode::Strict);
        print(&dom.document, &Profile::default().with_wrap(wrap))
    }

    #[test]
    fn blocks_are_indented_and_inline_content_sits_one_level_deeper() {
        let out = pretty(
            "<html><head><title>T</title></head><body><ul><li><p>one <em>two</em></p></li></ul></body></html>",
            200,
        );
        let expected = "<!DOCTYPE html>
<html>
  <head>
    <title>T</title>
  </head>
  <body>
    <ul>
      <li>
        <p>
          one <em>two</em>
        </p>
      </li>
    </ul>
  </body>
</html>
";
        assert_eq!(out, expected);
    }

    #[test]
    fn long_runs_wrap_at_whitespace_only() {
        let out = pretty(
            r#"<html><body><p>aaaa bbbb <span style="x y">cccc</span> dddd</p></body></html>"#,
            20,
        );
        assert!(out.contains("<span style=\"x y\">cccc</span>"));
        for line in out.lines() {
            if !line.contains('<') {
                assert!(line.chars().count() <= 20, "line too long: {line:?}");
            }
        }
    }

    #[test]
    fn void_elements_are_self_closed_and_break_lines() {
        let out = pretty("<html><body><p>a<br/>b</p><hr/></body></html>", 200);
        assert!(out.contains("a<br/>\n"));
        assert!(out.contains("      b\n"));
        assert!(out.contains("    <hr/>\n"));
        assert!(!out.contains("</br>"));

        let dom = parse("<html><body><hr/></body></html>", ParseMode::Strict);
        let profile = Profile {
            self_close_void: false,
            ..Profile::default()
        };
        assert!(print(&dom.document, &profile).contains("<hr>"));
    }

    #[test]
    fn text_and_attributes_are_escaped() {
        let out = pretty(
            "<html><body><p title=\"a&quot;b\">x &amp; y&#160;z &lt;</p></body></html>",
            200,
        );
        assert!(out.contains("title=\"a&quot;b\""));
        assert!(out.contains("x &amp; y&nbsp;z &lt;"));
    }

    #[test]
    fn prefixed_attributes_keep_their_prefix() {
        let html = dom::new_element("html");
        let aside = dom::new_element("aside");
        dom::set_attr(&aside, "epub:type", "footnote");
        dom::append(&html, &aside);
        let out = PrettyPrinter::new(&Profile::default()).print_document(&{
            let doc = dom::new_element("root");
            dom::append(&doc, &html);
            doc
        });
        assert!(out.contains("<aside epub:type=\"footnote\"></aside>"));
    }

    #[test]
    fn namespace_declarations_survive_a_strict_round_trip() {
        let src = r#"<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops"><head><title>t</title></head><body><aside epub:type="footnote" id="n1"><p>x</p></aside></body></html>"#;
        let out = pretty(src, 200);
        assert!(out.contains(
            "<html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\">"
        ));
        assert!(out.contains("<aside epub:type=\"footnote\" id=\"n1\">"));
        assert!(reparses_strictly(&out), "{out}");
    }

    #[test]
    fn foreign_elements_declare_their_namespace_once() {
        let dom = parse("<p>a<svg><circle r='1'/></svg></p>", ParseMode::Lenient);
        let out = print(&dom.document, &Profile::default());
        assert!(out.contains("<html xmlns=\"http://www.w3.org/1999/xhtml\">"));
        assert!(out.contains("<svg xmlns=\"http://www.w3.org/2000/svg\">\n"));
        assert!(out.contains("<circle r=\"1\"></circle>"));
        assert!(reparses_strictly(&out), "{out}");
    }

    #[test]
    fn pre_is_copied_without_reflow() {
        let out = pretty("<html><body><pre>a\n   b</pre></body></html>", 200);
        assert!(out.contains("<pre>a\n   b</pre>"));
    }

    #[test]
    fn output_reparses_to_the_same_content() {
        let src = "<html><head><title>Doc</title></head><body><h1>Title</h1><div><p>Some <strong>bold</strong> and <em>italic</em> text.</p><ul><li>item</li></ul></div></body></html>";
        let first = parse(src, ParseMode::Strict);
        let printed = print(&first.document, &Profile::default());
        let again = parse(&printed, ParseMode::Strict);

        let shape = |root: &Handle| -> Vec<String> {
            dom::descendants(root)
                .iter()
                .filter_map(|n| match dom::tag_name(n) {
                    Some(t) => Some(format!("<{t}>")),
                    None => dom::text_of(n)
                        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
                        .filter(|t| !t.is_empty()),
                })
                .collect()
        };
        assert_eq!(shape(&first.document), shape(&again.document));
    }
}
