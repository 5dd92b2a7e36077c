//! Pattern-based rewrite primitives shared by every tree pipeline.
//!
//! All sweeps are two-phase: collect the matching nodes from a fresh walk of the
//! live tree, then apply edits to that list. Sweeps that can expose new matches
//! loop until a fresh walk finds nothing.

use crate::dom;
use markup5ever_rcdom::Handle;

/// Which elements `retag_where_style_equals` touches.
#[derive(Clone, Copy, Debug)]
pub enum StyleMatch<'a> {
    /// Any element with the origin tag.
    Any,
    /// Only elements whose `style` attribute string-equals this value.
    Exactly(&'a str),
}

impl StyleMatch<'_> {
    fn matches(&self, node: &Handle) -> bool {
        match self {
            StyleMatch::Any => true,
            StyleMatch::Exactly(style) => dom::attr(node, "style").as_deref() == Some(*style),
        }
    }
}

/// Every element named `tag` under `root`, in document order.
pub fn find_all(root: &Handle, tag: &str) -> Vec<Handle> {
    dom::descendants(root)
        .into_iter()
        .filter(|n| dom::is_element(n, tag))
        .collect()
}

/// Delete every `tag` element matching `predicate`, repeating until a full
/// walk finds none. Returns the number of removed elements.
pub fn remove_if<F>(root: &Handle, tag: &str, mut predicate: F) -> usize
where
    F: FnMut(&Handle) -> bool,
{
    let mut removed = 0;
    let mut rounds = 0;
    loop {
        let matches: Vec<Handle> = find_all(root, tag)
            .into_iter()
            .filter(|n| predicate(n))
            .collect();
        if matches.is_empty() {
            break;
        }
        rounds += 1;
        for node in &matches {
            dom::detach(node);
        }
        removed += matches.len();
    }
    log::trace!("remove_if <{tag}>: {removed} removed in {rounds} round(s)");
    removed
}

/// Replace `element` in its parent with its own children, in order.
/// Returns false for a detached element.
pub fn unwrap(element: &Handle) -> bool {
    if dom::parent(element).is_none() {
        return false;
    }
    for child in dom::children(element) {
        let _ = dom::insert_before(element, &child);
    }
    dom::detach(element);
    true
}

/// Put a fresh `new_tag` element (no attributes) where `element` was and move
/// `element`'s children into it. Returns the new element, or `None` when
/// `element` is detached.
pub fn retag(element: &Handle, new_tag: &str) -> Option<Handle> {
    dom::parent(element)?;
    let replacement = dom::new_element(new_tag);
    let _ = dom::insert_before(element, &replacement);
    dom::move_children(element, &replacement);
    dom::detach(element);
    Some(replacement)
}

/// Retag every `origin_tag` element selected by `style` to `new_tag`, to a
/// fixed point. Returns the number of retagged elements.
pub fn retag_where_style_equals(
    root: &Handle,
    origin_tag: &str,
    style: StyleMatch<'_>,
    new_tag: &str,
) -> usize {
    let mut count = 0;
    loop {
        let matches: Vec<Handle> = find_all(root, origin_tag)
            .into_iter()
            .filter(|n| style.matches(n))
            .collect();
        if matches.is_empty() {
            break;
        }
        let before = count;
        for node in &matches {
            if retag(node, new_tag).is_some() {
                count += 1;
            }
        }
        if count == before {
            break;
        }
    }
    count
}

/// Unwrap every `tag` element under `root` to a fixed point.
pub fn unwrap_all(root: &Handle, tag: &str) -> usize {
    let mut count = 0;
    loop {
        let matches = find_all(root, tag);
        if matches.is_empty() {
            break;
        }
        let before = count;
        for node in &matches {
            if unwrap(node) {
                count += 1;
            }
        }
        if count == before {
            break;
        }
    }
    count
}

/// If `container` has exactly one child element, it is named `target`, and
/// there is no non-blank text beside it, put that child in the container's
/// place. Returns the promoted child.
pub fn promote_sole_child(container: &Handle, target: &str) -> Option<Handle> {
    let elements = dom::element_children(container);
    let [only] = elements.as_slice() else {
        return None;
    };
    if !dom::is_element(only, target) {
        return None;
    }
    let stray_text = dom::children(container)
        .iter()
        .filter_map(dom::text_of)
        .any(|t| !dom::is_blank(&t));
    if stray_text {
        return None;
    }
    if !dom::insert_before(container, only) {
        return None;
    }
    dom::detach(container);
    Some(only.clone())
}
