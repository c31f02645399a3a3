use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Chainable, Result};
use crate::markup::{is_void, Attr, Element, Node};

fn utf8(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn element(start: &BytesStart<'_>, self_closing: bool) -> Result<Element> {
    let mut attrs = vec![];
    for attr in start.html_attributes().with_checks(false) {
        let attr = attr.map_err(|e| error!("malformed attribute", e))?;
        attrs.push(Attr {
            name: utf8(attr.key.as_ref()),
            value: utf8(&attr.value),
        });
    }

    Ok(Element {
        name: utf8(start.name().as_ref()),
        attrs,
        children: vec![],
        self_closing,
    })
}

/// Parses well-formed-enough markup into a list of top-level nodes.
///
/// HTML void elements need no closing tag, and a closing tag implicitly
/// closes any elements still open inside it. Unknown entities are kept as
/// written. XML declarations, processing instructions and doctypes are
/// dropped.
pub fn parse_fragment(input: &str) -> Result<Vec<Node>> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(false);
    reader.config_mut().check_end_names = false;

    let mut roots: Vec<Node> = vec![];
    let mut stack: Vec<Element> = vec![];

    fn attach(node: Node, stack: &mut Vec<Element>, roots: &mut Vec<Node>) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }

    loop {
        let event = reader.read_event().chain_with(|| error! {
            "failed to parse markup",
            "byte offset" => reader.buffer_position(),
        })?;

        match event {
            Event::Start(start) => {
                let element = element(&start, false)?;
                if is_void(&element.name) {
                    attach(element.into(), &mut stack, &mut roots);
                } else {
                    stack.push(element);
                }
            }
            Event::Empty(start) => {
                let element = element(&start, true)?;
                attach(element.into(), &mut stack, &mut roots);
            }
            Event::End(end) => {
                let name = utf8(end.name().as_ref());
                if let Some(i) = stack.iter().rposition(|e| e.name == name) {
                    while stack.len() > i {
                        let Some(closed) = stack.pop() else { break };
                        attach(closed.into(), &mut stack, &mut roots);
                    }
                }
            }
            Event::Text(text) => attach(Node::Text(utf8(&text)), &mut stack, &mut roots),
            Event::CData(data) => {
                let raw = format!("<![CDATA[{}]]>", String::from_utf8_lossy(&data));
                attach(Node::Raw(raw), &mut stack, &mut roots);
            }
            Event::Comment(comment) => {
                let raw = format!("<!--{}-->", String::from_utf8_lossy(&comment));
                attach(Node::Raw(raw), &mut stack, &mut roots);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    while let Some(open) = stack.pop() {
        attach(open.into(), &mut stack, &mut roots);
    }

    Ok(roots)
}

/// Parses markup with exactly one root element, ignoring whitespace,
/// comments, and declarations around it.
pub fn parse_element(input: &str) -> Result<Element> {
    let mut roots = parse_fragment(input)?.into_iter()
        .filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        });

    match (roots.next(), roots.next()) {
        (Some(root), None) => Ok(root),
        (None, _) => err!("markup contains no root element"),
        (Some(first), Some(second)) => err! {
            "markup contains more than one root element",
            "first root" => first.name,
            "second root" => second.name,
        },
    }
}

/// Like [`parse_element`], but wraps several roots into a `<div>`.
pub fn parse_wrapped(input: &str) -> Result<Element> {
    let mut nodes = parse_fragment(input)?;
    let mut elements = nodes.iter().enumerate().filter_map(|(i, n)| n.as_element().map(|_| i));
    let (first, second) = (elements.next(), elements.next());
    if let (Some(i), None) = (first, second) {
        if let Node::Element(root) = nodes.swap_remove(i) {
            return Ok(root);
        }
    }

    Ok(Element::new("div").children(nodes))
}

/// Replaces every occurrence of each `(from, to)` pair, in order.
pub fn replace_all<'a>(input: &'a str, pairs: &[(&str, &str)]) -> Cow<'a, str> {
    let mut output = Cow::Borrowed(input);
    for (from, to) in pairs {
        if output.contains(from) {
            output = Cow::Owned(output.replace(from, to));
        }
    }

    output
}
