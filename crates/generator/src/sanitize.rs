//! Script removal for captured documents.
//!
//! The captured markup is parsed into a tree, every `script` element is
//! detached (inline or external, HTML or SVG), and the remaining tree is
//! serialized back without reformatting.

use html5ever::serialize::{SerializeOpts, serialize};
use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use snapshot_kit_core::Result;

fn parse(html: &str) -> RcDom {
    parse_document(RcDom::default(), ParseOpts::default()).one(html)
}

fn is_script(node: &Handle) -> bool {
    matches!(&node.data, NodeData::Element { name, .. } if &*name.local == "script")
}

/// Template contents live outside the regular child list
fn template_contents(node: &Handle) -> Option<Handle> {
    match &node.data {
        NodeData::Element {
            template_contents, ..
        } => template_contents.borrow().clone(),
        _ => None,
    }
}

fn remove_scripts(node: &Handle) -> usize {
    let mut removed = 0;
    node.children.borrow_mut().retain(|child| {
        let script = is_script(child);
        if script {
            removed += 1;
        }
        !script
    });

    for child in node.children.borrow().iter() {
        removed += remove_scripts(child);
    }
    if let Some(contents) = template_contents(node) {
        removed += remove_scripts(&contents);
    }

    removed
}

fn count_in(node: &Handle) -> usize {
    let own = usize::from(is_script(node));
    let children: usize = node.children.borrow().iter().map(count_in).sum();
    let template = template_contents(node).map_or(0, |contents| count_in(&contents));
    own + children + template
}

/// Remove every script element and serialize what remains
pub fn strip_scripts(html: &str) -> Result<String> {
    let dom = parse(html);
    let removed = remove_scripts(&dom.document);

    let mut out = Vec::with_capacity(html.len());
    let document: SerializableHandle = dom.document.clone().into();
    serialize(&mut out, &document, SerializeOpts::default())?;

    tracing::debug!("Removed {} script element(s)", removed);
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Number of script elements in a document
pub fn count_scripts(html: &str) -> usize {
    count_in(&parse(html).document)
}
