//! Word-processor (ODT → HTML export) normalizer.
//!
//! Strips presentation markup the exporter sprinkles everywhere, declares the
//! e-book namespaces and turns the exporter's footnote blocks into
//! `<aside epub:type="footnote">` elements.

use super::{Pass, PassContext, Pipeline, body, head, remove_head_style, replace_bold, replace_italic};
use crate::dom;
use crate::error::{NormalizeError, Result};
use crate::rewrite;
use markup5ever_rcdom::Handle;

const BODY_PRESENTATION_ATTRS: [&str; 5] = ["text", "link", "vlink", "dir", "style"];
const BLOCK_PRESENTATION_ATTRS: [&str; 3] = ["style", "align", "class"];
const STRIPPED_BLOCKS: [&str; 6] = ["p", "h1", "h2", "h3", "h4", "blockquote"];

pub fn pipeline() -> Pipeline {
    Pipeline {
        name: "normalize-odt-html",
        passes: vec![
            Pass::new("remove-head-style", remove_head_style),
            Pass::new("update-title", update_title),
            Pass::new("remove-meta", remove_meta),
            Pass::new("strip-block-attributes", strip_block_attributes),
            Pass::new("unwrap-spans", unwrap_spans),
            Pass::new("unwrap-fonts", unwrap_fonts),
            Pass::new("remove-empty-paragraphs", remove_empty_paragraphs),
            Pass::new("remove-empty-links", remove_empty_links),
            Pass::new("declare-namespaces", declare_namespaces),
            Pass::new("link-stylesheet", link_stylesheet),
            Pass::new("footnotes", footnotes),
            Pass::new("replace-italic", replace_italic),
            Pass::new("replace-bold", replace_bold),
        ],
    }
}

/// `chapter.01.html` → `chapter`.
pub fn title_from_file_name(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

fn update_title(html: &Handle, ctx: &PassContext<'_>) -> Result<usize> {
    let Some(source) = ctx.source_name.as_deref() else {
        log::debug!("no source name, title left as is");
        return Ok(0);
    };
    let head = head(html).ok_or_else(|| NormalizeError::structure("<html> has no <head>"))?;
    let title = match dom::child(&head, "title") {
        Some(title) => title,
        None => {
            let title = dom::new_element("title");
            dom::append(&head, &title);
            title
        }
    };
    for child in dom::children(&title) {
        dom::detach(&child);
    }
    dom::append(&title, &dom::new_text(title_from_file_name(source)));
    let _ = dom::remove_attr(&title, "xml:lang");
    Ok(1)
}

fn remove_meta(html: &Handle, _ctx: &PassContext<'_>) -> Result<usize> {
    let body = body(html)?;
    let mut removed = BODY_PRESENTATION_ATTRS
        .iter()
        .filter(|attr| dom::remove_attr(&body, attr))
        .count();
    removed += rewrite::remove_if(html, "meta", |_| true);
    removed += rewrite::remove_if(html, "link", |_| true);
    Ok(removed)
}

fn strip_block_attributes(html: &Handle, _ctx: &PassContext<'_>) -> Result<usize> {
    let mut stripped = 0;
    for tag in STRIPPED_BLOCKS {
        for element in rewrite::find_all(html, tag) {
            for attr in BLOCK_PRESENTATION_ATTRS {
                if dom::remove_attr(&element, attr) {
                    stripped += 1;
                }
            }
        }
    }
    Ok(stripped)
}

fn unwrap_spans(html: &Handle, _ctx: &PassContext<'_>) -> Result<usize> {
    Ok(rewrite::unwrap_all(html, "span"))
}

fn unwrap_fonts(html: &Handle, _ctx: &PassContext<'_>) -> Result<usize> {
    Ok(rewrite::unwrap_all(html, "font"))
}

fn has_no_text(element: &Handle) -> bool {
    dom::is_blank(&dom::text_content(element))
}

fn remove_empty_paragraphs(html: &Handle, _ctx: &PassContext<'_>) -> Result<usize> {
    Ok(rewrite::remove_if(html, "p", has_no_text))
}

fn remove_empty_links(html: &Handle, _ctx: &PassContext<'_>) -> Result<usize> {
    Ok(rewrite::remove_if(html, "a", has_no_text))
}

fn declare_namespaces(html: &Handle, ctx: &PassContext<'_>) -> Result<usize> {
    let _ = dom::remove_attr(html, "xmlns:epub");
    dom::set_attr(html, "xmlns:epub", &ctx.profile.epub_namespace);
    let _ = dom::remove_attr(html, "xmlns");
    dom::set_attr(html, "xmlns", &ctx.profile.xhtml_namespace);
    Ok(2)
}

fn link_stylesheet(html: &Handle, ctx: &PassContext<'_>) -> Result<usize> {
    let head = head(html).ok_or_else(|| NormalizeError::structure("<html> has no <head>"))?;
    let link = dom::new_element("link");
    dom::set_attr(&link, "rel", "stylesheet");
    dom::set_attr(&link, "href", &ctx.profile.stylesheet_href);
    dom::set_attr(&link, "type", "text/css");
    dom::append(&head, &link);
    Ok(1)
}

/// Move each footnote body next to where it was, inside an `<aside>`.
///
/// A reference is `<a class="sdfootnoteanc" href="#NAME">`; its body is the
/// container two levels above `<a name="NAME">`. The aside takes the container's
/// place and content, minus the back-link anchor.
fn footnotes(html: &Handle, ctx: &PassContext<'_>) -> Result<usize> {
    let class = ctx.profile.footnote_class.as_str();
    let references: Vec<Handle> = rewrite::find_all(html, "a")
        .into_iter()
        .filter(|a| dom::attr(a, "class").as_deref() == Some(class))
        .collect();

    for reference in &references {
        let _ = dom::remove_attr(reference, "class");
        let _ = dom::remove_attr(reference, "name");
        let href = dom::attr(reference, "href").unwrap_or_default();
        let target_name = href.strip_prefix('#').ok_or_else(|| {
            NormalizeError::structure(format!("footnote reference has no fragment link: {href:?}"))
        })?;

        let target = rewrite::find_all(html, "a")
            .into_iter()
            .find(|a| dom::attr(a, "name").as_deref() == Some(target_name))
            .ok_or_else(|| {
                NormalizeError::structure(format!("footnote target {target_name:?} not found"))
            })?;
        let container = dom::parent(&target)
            .and_then(|paragraph| dom::parent(&paragraph))
            .filter(|c| !dom::is_element(c, "body") && !dom::is_element(c, "html"))
            .ok_or_else(|| {
                NormalizeError::structure(format!(
                    "footnote target {target_name:?} is not inside a footnote container"
                ))
            })?;

        let aside = dom::new_element("aside");
        dom::set_attr(&aside, "epub:type", "footnote");
        dom::set_attr(&aside, "id", target_name);
        if !dom::insert_before(&container, &aside) {
            return Err(NormalizeError::structure(format!(
                "footnote container of {target_name:?} is detached"
            )));
        }
        dom::detach(&target);
        dom::move_children(&container, &aside);
        dom::detach(&container);
    }
    Ok(references.len())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::config::Profile;
    use crate::pipeline::root_element;

    const FOOTNOTE_DOC: &str = r##"<html><head><title>x</title></head><body>
<p>Text<a class="sdfootnoteanc" name="fn1anc" href="#fn1"><sup>1</sup></a> continues.</p>
<div id="sdfootnote1"><p><a class="sdfootnotesym" name="fn1" href="#fn1anc">*</a>The <i>note</i> body.</p></div>
</body></html>"##;

    #[test]
    fn footnote_container_becomes_aside() {
        let dom = lenient(FOOTNOTE_DOC);
        let html = root_element(&dom).unwrap();
        let profile = Profile::odt();
        assert_eq!(footnotes(&html, &ctx(&profile)).unwrap(), 1);

        let body = body(&html).unwrap();
        assert_eq!(shape(&body), ["p", "aside"]);
        let aside = dom::child(&body, "aside").unwrap();
        assert_eq!(dom::attr(&aside, "epub:type").as_deref(), Some("footnote"));
        assert_eq!(dom::attr(&aside, "id").as_deref(), Some("fn1"));
        assert_eq!(dom::text_content(&aside), "The note body.");
        assert!(dom::find_first(&aside, "i").is_some());
        assert!(dom::find_first(&aside, "a").is_none());

        let reference = dom::find_first(&body, "a").unwrap();
        assert!(!dom::has_attr(&reference, "class"));
        assert!(!dom::has_attr(&reference, "name"));
        assert_eq!(dom::attr(&reference, "href").as_deref(), Some("#fn1"));
    }

    #[test]
    fn missing_footnote_target_is_a_structural_error() {
        let dom = lenient(
            r##"<p>x<a class="sdfootnoteanc" href="#nowhere">1</a></p>"##,
        );
        let html = root_element(&dom).unwrap();
        let profile = Profile::odt();
        let err = footnotes(&html, &ctx(&profile)).unwrap_err();
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn footnote_target_directly_in_body_paragraph_is_rejected() {
        let dom = lenient(
            r##"<p>x<a class="sdfootnoteanc" href="#fn1">1</a></p><p><a name="fn1">*</a>n</p>"##,
        );
        let html = root_element(&dom).unwrap();
        let profile = Profile::odt();
        assert!(matches!(
            footnotes(&html, &ctx(&profile)),
            Err(NormalizeError::StructuralAssumptionViolated(_))
        ));
    }

    #[test]
    fn title_comes_from_file_name_without_extensions() {
        assert_eq!(title_from_file_name("capitolo.uno.html"), "capitolo");
        assert_eq!(title_from_file_name("plain"), "plain");

        let dom = lenient("<html><head></head><body><p>x</p></body></html>");
        let html = root_element(&dom).unwrap();
        let profile = Profile::odt();
        let ctx = PassContext {
            profile: &profile,
            source_name: Some("Libro.odt.html".to_string()),
        };
        update_title(&html, &ctx).unwrap();
        let title = dom::find_first(&html, "title").unwrap();
        assert_eq!(dom::text_content(&title), "Libro");
    }

    #[test]
    fn presentation_markup_is_stripped() {
        let dom = lenient(
            r##"<html><head><meta charset="utf-8"><link rel="x" href="y"></head><body text="#000" dir="ltr" lang="it"><p class="c" align="left" style="s" id="k">a</p><h3 class="c">b</h3></body></html>"##,
        );
        let html = root_element(&dom).unwrap();
        let profile = Profile::odt();
        remove_meta(&html, &ctx(&profile)).unwrap();
        strip_block_attributes(&html, &ctx(&profile)).unwrap();

        assert!(rewrite::find_all(&html, "meta").is_empty());
        assert!(rewrite::find_all(&html, "link").is_empty());
        let body = body(&html).unwrap();
        assert_eq!(
            dom::attributes(&body),
            vec![("lang".to_string(), "it".to_string())]
        );
        let p = dom::child(&body, "p").unwrap();
        assert_eq!(
            dom::attributes(&p),
            vec![("id".to_string(), "k".to_string())]
        );
        assert!(dom::attributes(&dom::child(&body, "h3").unwrap()).is_empty());
    }

    #[test]
    fn spans_fonts_and_empty_nodes_go_away() {
        let dom = lenient(
            r#"<p><span><font face="x">a<span>b</span></font></span></p><p> <span> </span></p><p><a name="bm"></a>c</p>"#,
        );
        let html = root_element(&dom).unwrap();
        let profile = Profile::odt();
        let c = ctx(&profile);
        unwrap_spans(&html, &c).unwrap();
        unwrap_fonts(&html, &c).unwrap();
        remove_empty_paragraphs(&html, &c).unwrap();
        remove_empty_links(&html, &c).unwrap();

        let body = body(&html).unwrap();
        let paragraphs = dom::children_named(&body, "p");
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(dom::text_content(&paragraphs[0]), "ab");
        assert!(dom::element_children(&paragraphs[0]).is_empty());
        assert!(rewrite::find_all(&html, "a").is_empty());
    }

    #[test]
    fn namespaces_and_stylesheet_are_declared() {
        let dom = lenient("<html lang=\"it\"><head></head><body></body></html>");
        let html = root_element(&dom).unwrap();
        let profile = Profile::odt();
        declare_namespaces(&html, &ctx(&profile)).unwrap();
        link_stylesheet(&html, &ctx(&profile)).unwrap();
        assert_eq!(
            dom::attr(&html, "xmlns").as_deref(),
            Some("http://www.w3.org/1999/xhtml")
        );
        assert_eq!(
            dom::attr(&html, "xmlns:epub").as_deref(),
            Some("http://www.idpf.org/2007/ops")
        );
        let link = dom::find_first(&html, "link").unwrap();
        assert_eq!(
            dom::attr(&link, "href").as_deref(),
            Some("../Styles/Style0001.css")
        );
    }
}
