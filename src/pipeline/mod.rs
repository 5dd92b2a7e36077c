//! Pass pipelines for the tree normalizers.
//!
//! A [`Pipeline`] is an ordered list of named [`Pass`]es. Each pass edits the
//! document in place and reports how many rewrites it applied; the first
//! failing pass aborts the run.

pub mod generic;
pub mod odt;

use crate::config::Profile;
use crate::dom;
use crate::error::{NormalizeError, Result};
use crate::rewrite::{self, StyleMatch};
use markup5ever_rcdom::{Handle, RcDom};

/// What a pass can see besides the tree.
pub struct PassContext<'a> {
    pub profile: &'a Profile,
    /// Input file name, used for the document title.
    pub source_name: Option<String>,
}

pub type PassFn = fn(&Handle, &PassContext<'_>) -> Result<usize>;

#[derive(Clone, Copy)]
pub struct Pass {
    pub name: &'static str,
    pub run: PassFn,
}

impl Pass {
    pub const fn new(name: &'static str, run: PassFn) -> Self {
        Pass { name, run }
    }
}

pub struct Pipeline {
    pub name: &'static str,
    pub passes: Vec<Pass>,
}

impl Pipeline {
    /// Run every pass against the `html` root of `dom`.
    pub fn run(&self, dom: &RcDom, ctx: &PassContext<'_>) -> Result<()> {
        let html = root_element(dom)?;
        log::info!("{}: running {} passes", self.name, self.passes.len());
        for pass in &self.passes {
            let rewrites = (pass.run)(&html, ctx)?;
            log::debug!("{}/{}: {rewrites} rewrite(s)", self.name, pass.name);
        }
        log::info!("{}: done", self.name);
        Ok(())
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name).collect()
    }
}

/* =============================== Lookups ================================= */

/// The single `html` element of the document.
pub fn root_element(dom: &RcDom) -> Result<Handle> {
    let html = dom::document_element(&dom.document)
        .ok_or_else(|| NormalizeError::structure("document has no root element"))?;
    if !dom::is_element(&html, "html") {
        return Err(NormalizeError::structure(format!(
            "root element is <{}>, expected <html>",
            dom::tag_name(&html).unwrap_or_default()
        )));
    }
    Ok(html)
}

pub fn body(html: &Handle) -> Result<Handle> {
    dom::child(html, "body").ok_or_else(|| NormalizeError::structure("<html> has no <body>"))
}

pub fn head(html: &Handle) -> Option<Handle> {
    dom::child(html, "head")
}

/* ============================ Shared passes ============================== */

pub(crate) fn remove_head_style(html: &Handle, _ctx: &PassContext<'_>) -> Result<usize> {
    let Some(head) = head(html) else {
        log::debug!("no <head>, nothing to strip");
        return Ok(0);
    };
    let styles = dom::children_named(&head, "style");
    for style in &styles {
        dom::detach(style);
    }
    Ok(styles.len())
}

pub(crate) fn replace_bold(html: &Handle, ctx: &PassContext<'_>) -> Result<usize> {
    let spans = rewrite::retag_where_style_equals(
        html,
        "span",
        StyleMatch::Exactly(&ctx.profile.bold_style),
        "strong",
    );
    let bs = rewrite::retag_where_style_equals(html, "b", StyleMatch::Any, "strong");
    Ok(spans + bs)
}

pub(crate) fn replace_italic(html: &Handle, ctx: &PassContext<'_>) -> Result<usize> {
    Ok(rewrite::retag_where_style_equals(
        html,
        "span",
        StyleMatch::Exactly(&ctx.profile.italic_style),
        "em",
    ))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::ParseMode;
    use crate::loader::parse_str;
    use std::path::Path;

    pub fn strict(src: &str) -> RcDom {
        parse_str(src, ParseMode::Strict, Path::new("fixture.html")).unwrap()
    }

    pub fn lenient(src: &str) -> RcDom {
        parse_str(src, ParseMode::Lenient, Path::new("fixture.html")).unwrap()
    }

    pub fn ctx(profile: &Profile) -> PassContext<'_> {
        PassContext {
            profile,
            source_name: None,
        }
    }

    /// Tag names and trimmed text of `node`'s children; blank text skipped.
    pub fn shape(node: &Handle) -> Vec<String> {
        dom::children(node)
            .iter()
            .filter_map(|n| match dom::tag_name(n) {
                Some(t) => Some(t.to_string()),
                None => dom::text_of(n)
                    .map(|t| dom::trim_blank(&t).to_string())
                    .filter(|t| !t.is_empty())
                    .map(|t| format!("#{t}")),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn bold_spans_and_b_become_strong() {
        let dom = strict(
            r#"<html><body><p><span style="font-weight: bold;">word</span><b>word</b><span style="font-weight: bold; color:red;">word</span></p></body></html>"#,
        );
        let html = root_element(&dom).unwrap();
        let profile = Profile::default();
        assert_eq!(replace_bold(&html, &ctx(&profile)).unwrap(), 2);
        let p = dom::find_first(&html, "p").unwrap();
        assert_eq!(shape(&p), ["strong", "strong", "span"]);
    }

    #[test]
    fn italic_spans_become_em() {
        let dom = strict(
            r#"<html><body><p><span style="font-style: italic;">word</span></p></body></html>"#,
        );
        let html = root_element(&dom).unwrap();
        let profile = Profile::default();
        assert_eq!(replace_italic(&html, &ctx(&profile)).unwrap(), 1);
        assert!(dom::find_first(&html, "em").is_some());
    }

    #[test]
    fn root_must_be_html() {
        let dom = strict("<doc><body/></doc>");
        assert!(matches!(
            root_element(&dom),
            Err(NormalizeError::StructuralAssumptionViolated(_))
        ));
    }

    #[test]
    fn failing_pass_stops_the_pipeline() {
        fn fails(_: &Handle, _: &PassContext<'_>) -> Result<usize> {
            Err(NormalizeError::structure("boom"))
        }
        fn marks(html: &Handle, _: &PassContext<'_>) -> Result<usize> {
            dom::set_attr(html, "touched", "yes");
            Ok(1)
        }
        let pipeline = Pipeline {
            name: "test",
            passes: vec![Pass::new("fails", fails), Pass::new("marks", marks)],
        };
        let dom = strict("<html><body/></html>");
        let profile = Profile::default();
        assert!(pipeline.run(&dom, &ctx(&profile)).is_err());
        let html = root_element(&dom).unwrap();
        assert!(!dom::has_attr(&html, "touched"));
    }
}
