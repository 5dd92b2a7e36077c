//! Generic normalizer for note-taking exports already parsed as XML.
//!
//! The export wraps everything in a fixed scaffold: a lead link, heading and
//! container, then `div > span > div` holding the actual content. The first
//! passes remove that scaffold by position and fail if it is not there.

use super::{Pass, PassContext, Pipeline, body, head, remove_head_style, replace_bold, replace_italic};
use crate::dom;
use crate::error::{NormalizeError, Result};
use crate::rewrite::{self, StyleMatch};
use markup5ever_rcdom::Handle;

pub fn pipeline() -> Pipeline {
    Pipeline {
        name: "normalize-html",
        passes: vec![
            Pass::new("remove-base-font", remove_base_font),
            Pass::new("remove-head-style", remove_head_style),
            Pass::new("remove-lead-boilerplate", remove_lead_boilerplate),
            Pass::new("hoist-base-container", hoist_base_container),
            Pass::new("tables-to-headings", tables_to_headings),
            Pass::new("collapse-heading-wrappers", collapse_heading_wrappers),
            Pass::new("flatten-body-containers", flatten_body_containers),
            Pass::new("remove-empty-containers", remove_empty_containers),
            Pass::new("rehome-text-containers", rehome_text_containers),
            Pass::new("replace-bold", replace_bold),
            Pass::new("replace-italic", replace_italic),
            Pass::new("replace-justify", replace_justify),
            Pass::new("substitute-glyphs", substitute_glyphs),
        ],
    }
}

fn remove_base_font(html: &Handle, _ctx: &PassContext<'_>) -> Result<usize> {
    let Some(head) = head(html) else {
        return Ok(0);
    };
    let fonts = dom::children_named(&head, "basefont");
    for font in &fonts {
        dom::detach(font);
    }
    Ok(fonts.len())
}

fn require_child(parent: &Handle, tag: &str, what: &str) -> Result<Handle> {
    dom::child(parent, tag).ok_or_else(|| {
        NormalizeError::structure(format!("expected {what} (<{tag}>) was not found"))
    })
}

fn remove_lead_boilerplate(html: &Handle, _ctx: &PassContext<'_>) -> Result<usize> {
    let body = body(html)?;
    let lead_link = require_child(&body, "a", "lead link in <body>")?;
    let lead_heading = require_child(&body, "h1", "lead heading in <body>")?;
    let lead_container = require_child(&body, "div", "lead container in <body>")?;
    for node in [&lead_link, &lead_heading, &lead_container] {
        dom::detach(node);
    }
    let breaks = dom::children_named(&body, "br");
    for br in &breaks {
        dom::detach(br);
    }
    Ok(3 + breaks.len())
}

/// `body > div > span > div`: move the innermost container's content up to
/// where the outer container was and drop the chain.
fn hoist_base_container(html: &Handle, _ctx: &PassContext<'_>) -> Result<usize> {
    let body = body(html)?;
    let outer = require_child(&body, "div", "base container in <body>")?;
    let span = require_child(&outer, "span", "<span> inside the base container")?;
    let inner = require_child(&span, "div", "inner container inside the base <span>")?;

    for br in dom::children_named(&inner, "br") {
        dom::detach(&br);
    }
    let mut hoisted = 0;
    for child in dom::children(&inner) {
        let keep = match dom::text_of(&child) {
            Some(text) => !dom::is_blank(&text),
            None => dom::tag_name(&child).is_some(),
        };
        if keep {
            let _ = dom::insert_before(&outer, &child);
            hoisted += 1;
        }
    }
    dom::detach(&outer);
    Ok(hoisted)
}

/// Colored title tables become a plain `<h1>` with the title text.
fn tables_to_headings(html: &Handle, _ctx: &PassContext<'_>) -> Result<usize> {
    let body = body(html)?;
    let mut converted = 0;
    for container in dom::children_named(&body, "div") {
        let Some(table) = dom::child(&container, "table") else {
            continue;
        };
        if dom::attr(&table, "bgcolor").map_or(true, |c| c.is_empty()) {
            continue;
        }
        let row = dom::child(&table, "tr")
            .or_else(|| dom::child(&table, "tbody").and_then(|tb| dom::child(&tb, "tr")))
            .ok_or_else(|| NormalizeError::structure("title table has no row"))?;
        let cell = require_child(&row, "td", "cell in the title table's first row")?;
        let title = require_child(&cell, "h1", "heading in the title table's first cell")?;

        let heading = dom::new_element("h1");
        dom::append(&heading, &dom::new_text(dom::trim_blank(&dom::text_content(&title))));
        let _ = dom::insert_before(&table, &heading);
        dom::detach(&table);
        converted += 1;
    }
    Ok(converted)
}

fn collapse_heading_wrappers(html: &Handle, _ctx: &PassContext<'_>) -> Result<usize> {
    let body = body(html)?;
    let mut collapsed = 0;
    loop {
        let mut promoted = 0;
        for div in dom::children_named(&body, "div") {
            if rewrite::promote_sole_child(&div, "h1").is_some() {
                promoted += 1;
            }
        }
        if promoted == 0 {
            break;
        }
        collapsed += promoted;
    }
    Ok(collapsed)
}

/// Splice every body-level container's children into the body. Containers
/// brought up by this splice are left for the following passes.
fn flatten_body_containers(html: &Handle, _ctx: &PassContext<'_>) -> Result<usize> {
    let body = body(html)?;
    let containers = dom::children_named(&body, "div");
    for div in &containers {
        let _ = rewrite::unwrap(div);
    }
    Ok(containers.len())
}

fn remove_empty_containers(html: &Handle, _ctx: &PassContext<'_>) -> Result<usize> {
    Ok(rewrite::remove_if(html, "div", |div| {
        dom::is_blank(&dom::text_content(div))
    }))
}

fn starts_with_text_or_span(div: &Handle) -> bool {
    let children = div.children.borrow();
    let Some(first) = children.first() else {
        return false;
    };
    match dom::text_of(first) {
        Some(text) => !dom::is_blank(&text),
        None => dom::is_element(first, "span"),
    }
}

/// Containers that open with text or a `<span>` hold running text: inside a
/// list item they dissolve into it, elsewhere they become paragraphs.
fn rehome_text_containers(html: &Handle, _ctx: &PassContext<'_>) -> Result<usize> {
    let mut rehomed = 0;
    let mut rounds = 0;
    loop {
        let matches: Vec<Handle> = rewrite::find_all(html, "div")
            .into_iter()
            .filter(starts_with_text_or_span)
            .collect();
        if matches.is_empty() {
            break;
        }
        rounds += 1;
        let before = rehomed;
        for div in &matches {
            let in_list_item = dom::parent(div).is_some_and(|p| dom::is_element(&p, "li"));
            let done = if in_list_item {
                rewrite::unwrap(div)
            } else {
                rewrite::retag(div, "p").is_some()
            };
            if done {
                rehomed += 1;
            }
        }
        if rehomed == before {
            break;
        }
    }
    log::trace!("rehome-text-containers converged after {rounds} round(s)");
    Ok(rehomed)
}

fn replace_justify(html: &Handle, ctx: &PassContext<'_>) -> Result<usize> {
    Ok(rewrite::retag_where_style_equals(
        html,
        "div",
        StyleMatch::Exactly(&ctx.profile.justify_style),
        "p",
    ))
}

fn substitute_glyphs(html: &Handle, ctx: &PassContext<'_>) -> Result<usize> {
    let substitutions = &ctx.profile.glyph_substitutions;
    if substitutions.is_empty() {
        return Ok(0);
    }
    let mut changed = 0;
    for node in dom::descendants(html) {
        let Some(text) = dom::text_of(&node) else {
            continue;
        };
        let replaced = substitutions
            .iter()
            .fold(text.clone(), |acc, (from, to)| acc.replace(*from, &to.to_string()));
        if replaced != text {
            dom::set_text(&node, &replaced);
            changed += 1;
        }
    }
    Ok(changed)
}
