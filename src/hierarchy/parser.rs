use anyhow::{anyhow, bail, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::types::{NodeId, Tree};

/// Parse a window-hierarchy dump into an arena tree
pub fn parse(xml: &str) -> Result<Tree> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut tree = Tree::new();
    let mut stack: Vec<NodeId> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let parent = stack.last().copied().unwrap_or(Tree::ROOT);
                let id = push_element(&mut tree, parent, &e);
                stack.push(id);
            }
            Ok(Event::Empty(e)) => {
                let parent = stack.last().copied().unwrap_or(Tree::ROOT);
                push_element(&mut tree, parent, &e);
            }
            Ok(Event::End(_)) => {
                if stack.pop().is_none() {
                    bail!("unexpected closing tag at byte {}", reader.buffer_position());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(anyhow!(
                    "malformed hierarchy at byte {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        bail!("hierarchy ended with {} unclosed element(s)", stack.len());
    }
    if tree.is_empty() {
        bail!("hierarchy contains no elements");
    }

    Ok(tree)
}

fn push_element(tree: &mut Tree, parent: NodeId, e: &BytesStart<'_>) -> NodeId {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let attributes = e
        .attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string());
            (key, value)
        })
        .collect();

    tree.push(parent, name, attributes)
}
