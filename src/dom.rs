//! Small, explicit helpers over the `markup5ever_rcdom` tree.
//!
//! The rcdom node keeps its parent as a `Cell<Option<Weak<Node>>>` and its children
//! as a `RefCell<Vec<Rc<Node>>>`. Every helper here keeps the two in sync: a node is
//! listed in exactly one parent's children, and its parent pointer names that parent.
//! Nothing in this module panics on a missing node; lookups return `Option`.

use html5ever::tendril::StrTendril;
use html5ever::{Attribute, LocalName, Namespace, Prefix, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData};
use std::cell::RefCell;
use std::rc::Rc;

pub const HTML_NS: &str = "http://www.w3.org/1999/xhtml";
const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/* ============================== Construction ============================= */

/// Fresh, detached element with no attributes.
pub fn new_element(tag: &str) -> Handle {
    Node::new(NodeData::Element {
        name: QualName::new(None, Namespace::from(HTML_NS), LocalName::from(tag)),
        attrs: RefCell::new(Vec::new()),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    })
}

pub fn new_text(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from(text)),
    })
}

/* =============================== Inspection ============================== */

/// Local tag name, `None` for non-elements.
pub fn tag_name(node: &Handle) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(&*name.local),
        _ => None,
    }
}

pub fn is_element(node: &Handle, tag: &str) -> bool {
    tag_name(node) == Some(tag)
}

/// `prefix:local` as written in the source.
pub fn qualified_name(name: &QualName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{}:{}", &**prefix, &*name.local),
        None => name.local.to_string(),
    }
}

fn attr_matches(attr: &Attribute, name: &str) -> bool {
    match &attr.name.prefix {
        Some(prefix) => name
            .split_once(':')
            .is_some_and(|(p, l)| p == &**prefix && l == &*attr.name.local),
        None => &*attr.name.local == name,
    }
}

pub fn attr(node: &Handle, name: &str) -> Option<String> {
    let NodeData::Element { attrs, .. } = &node.data else {
        return None;
    };
    let attrs = attrs.borrow();
    attrs
        .iter()
        .find(|a| attr_matches(a, name))
        .map(|a| a.value.to_string())
}

pub fn has_attr(node: &Handle, name: &str) -> bool {
    attr(node, name).is_some()
}

/// All attributes as `(qualified name, value)` pairs, in source order.
pub fn attributes(node: &Handle) -> Vec<(String, String)> {
    let NodeData::Element { attrs, .. } = &node.data else {
        return Vec::new();
    };
    attrs
        .borrow()
        .iter()
        .map(|a| (qualified_name(&a.name), a.value.to_string()))
        .collect()
}

/* ============================ Attribute edits ============================ */

fn attr_qual_name(name: &str) -> QualName {
    match name.split_once(':') {
        Some((prefix, local)) => {
            let ns = match prefix {
                "xmlns" => Namespace::from(XMLNS_NS),
                "xml" => Namespace::from(XML_NS),
                _ => Namespace::from(""),
            };
            QualName::new(Some(Prefix::from(prefix)), ns, LocalName::from(local))
        }
        None => QualName::new(None, Namespace::from(""), LocalName::from(name)),
    }
}

/// Set or replace an attribute. Non-elements are left alone.
pub fn set_attr(node: &Handle, name: &str, value: &str) {
    let NodeData::Element { attrs, .. } = &node.data else {
        return;
    };
    let mut attrs = attrs.borrow_mut();
    if let Some(existing) = attrs.iter_mut().find(|a| attr_matches(a, name)) {
        existing.value = StrTendril::from(value);
    } else {
        attrs.push(Attribute {
            name: attr_qual_name(name),
            value: StrTendril::from(value),
        });
    }
}

/// Returns whether anything was removed.
pub fn remove_attr(node: &Handle, name: &str) -> bool {
    let NodeData::Element { attrs, .. } = &node.data else {
        return false;
    };
    let mut attrs = attrs.borrow_mut();
    let before = attrs.len();
    attrs.retain(|a| !attr_matches(a, name));
    before != attrs.len()
}

/* ================================ Text ==================================== */

/// Concatenated text of every descendant text node.
pub fn text_content(node: &Handle) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text(node: &Handle, out: &mut String) {
    match &node.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        _ => {
            for child in node.children.borrow().iter() {
                collect_text(child, out);
            }
        }
    }
}

/// Text of a text node, `None` otherwise.
pub fn text_of(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

pub fn set_text(node: &Handle, text: &str) {
    if let NodeData::Text { contents } = &node.data {
        *contents.borrow_mut() = StrTendril::from(text);
    }
}

/// Whitespace as PHP-era exporters trim it: space, tab, LF, CR, NUL, VT.
/// Non-breaking spaces count as content.
pub fn is_blank(s: &str) -> bool {
    trim_blank(s).is_empty()
}

pub fn trim_blank(s: &str) -> &str {
    s.trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r' | '\0' | '\x0B'))
}

/* ============================== Navigation =============================== */

pub fn parent(node: &Handle) -> Option<Handle> {
    let weak = node.parent.take()?;
    let parent = weak.upgrade();
    node.parent.set(Some(weak));
    parent
}

/// Parent and this node's index among the parent's children.
pub fn parent_and_index(node: &Handle) -> Option<(Handle, usize)> {
    let parent = parent(node)?;
    let index = parent
        .children
        .borrow()
        .iter()
        .position(|child| Rc::ptr_eq(child, node))?;
    Some((parent, index))
}

/// Snapshot of the child list; safe to hold across edits.
pub fn children(node: &Handle) -> Vec<Handle> {
    node.children.borrow().clone()
}

pub fn element_children(node: &Handle) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|c| tag_name(c).is_some())
        .cloned()
        .collect()
}

/// First direct child element named `tag`.
pub fn child(node: &Handle, tag: &str) -> Option<Handle> {
    node.children
        .borrow()
        .iter()
        .find(|c| is_element(c, tag))
        .cloned()
}

pub fn children_named(node: &Handle, tag: &str) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|c| is_element(c, tag))
        .cloned()
        .collect()
}

/// Every descendant of `root` (excluding `root`), in document order.
pub fn descendants(root: &Handle) -> Vec<Handle> {
    let mut out = Vec::new();
    let mut stack: Vec<Handle> = root.children.borrow().iter().rev().cloned().collect();
    while let Some(node) = stack.pop() {
        stack.extend(node.children.borrow().iter().rev().cloned());
        out.push(node);
    }
    out
}

/// First descendant element named `tag`, document order.
pub fn find_first(root: &Handle, tag: &str) -> Option<Handle> {
    descendants(root).into_iter().find(|n| is_element(n, tag))
}

/// The root element of a document node.
pub fn document_element(document: &Handle) -> Option<Handle> {
    document
        .children
        .borrow()
        .iter()
        .find(|c| tag_name(c).is_some())
        .cloned()
}

/* =============================== Mutation ================================ */

/// Remove `node` from its parent. A detached node stays detached.
pub fn detach(node: &Handle) {
    if let Some((parent, index)) = parent_and_index(node) {
        let _ = parent.children.borrow_mut().remove(index);
    }
    node.parent.set(None);
}

pub fn append(parent: &Handle, child: &Handle) {
    detach(child);
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child.clone());
}

/// Insert `child` immediately before `sibling`. Returns false when `sibling`
/// has no parent.
pub fn insert_before(sibling: &Handle, child: &Handle) -> bool {
    detach(child);
    let Some((parent, index)) = parent_and_index(sibling) else {
        return false;
    };
    child.parent.set(Some(Rc::downgrade(&parent)));
    parent.children.borrow_mut().insert(index, child.clone());
    true
}

/// Move every child of `from` to the end of `to`, keeping their order.
pub fn move_children(from: &Handle, to: &Handle) {
    for child in children(from) {
        append(to, &child);
    }
}
