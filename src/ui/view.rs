//! A small element tree that serializes to escaped HTML.
//!
//! Text and attribute values are always escaped on output, so content coming
//! back from the story backend can never inject markup.

use std::fmt::Write;

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "link"];

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: &'static str,
    pub attrs: Vec<(&'static str, String)>,
    pub children: Vec<Node>,
}

pub fn el(tag: &'static str) -> Element {
    Element {
        tag,
        attrs: Vec::new(),
        children: Vec::new(),
    }
}

pub fn text(value: impl Into<String>) -> Node {
    Node::Text(value.into())
}

impl Element {
    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    /// Boolean attribute, only emitted when `on` is true.
    pub fn flag(self, name: &'static str, on: bool) -> Self {
        if on { self.attr(name, "") } else { self }
    }

    pub fn class(self, value: impl Into<String>) -> Self {
        self.attr("class", value)
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(nodes);
        self
    }

    pub fn text(self, value: impl Into<String>) -> Self {
        self.child(text(value))
    }

    #[cfg(test)]
    pub fn has_class(&self, class: &str) -> bool {
        self.attrs
            .iter()
            .any(|(name, value)| *name == "class" && value.split_whitespace().any(|c| c == class))
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl Node {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(value) => out.push_str(&html_escape::encode_text(value)),
            Node::Element(element) => {
                let _ = write!(out, "<{}", element.tag);
                for (name, value) in &element.attrs {
                    if value.is_empty() && !matches!(*name, "class" | "value") {
                        let _ = write!(out, " {}", name);
                    } else {
                        let _ = write!(
                            out,
                            " {}=\"{}\"",
                            name,
                            html_escape::encode_double_quoted_attribute(value)
                        );
                    }
                }
                out.push('>');
                if VOID_TAGS.contains(&element.tag) {
                    return;
                }
                for child in &element.children {
                    child.write_html(out);
                }
                let _ = write!(out, "</{}>", element.tag);
            }
        }
    }

    /// Counts elements in this subtree that carry `class`.
    #[cfg(test)]
    pub fn count_class(&self, class: &str) -> usize {
        match self {
            Node::Text(_) => 0,
            Node::Element(element) => {
                let own = usize::from(element.has_class(class));
                own + element
                    .children
                    .iter()
                    .map(|child| child.count_class(class))
                    .sum::<usize>()
            }
        }
    }

    /// Concatenated text of this subtree.
    #[cfg(test)]
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(value) => value.clone(),
            Node::Element(element) => element.children.iter().map(Node::text_content).collect(),
        }
    }
}

pub fn render_all(nodes: &[Node]) -> String {
    nodes.iter().map(Node::to_html).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_attributes_are_escaped() {
        let node: Node = el("p")
            .attr("title", r#"a "quoted" <b>"#)
            .text("<script>alert(1)</script> & more")
            .into();
        let html = node.to_html();
        assert!(html.starts_with("<p title=\"a "));
        assert!(!html.contains("\"quoted\""));
        assert!(html.ends_with(">&lt;script&gt;alert(1)&lt;/script&gt; &amp; more</p>"));
    }

    #[test]
    fn boolean_flags_render_bare() {
        let node: Node = el("button").flag("disabled", true).flag("hidden", false).text("Go").into();
        assert_eq!(node.to_html(), "<button disabled>Go</button>");
    }

    #[test]
    fn void_elements_have_no_closing_tag() {
        let node: Node = el("input").attr("name", "title").attr("value", "").into();
        assert_eq!(node.to_html(), "<input name=\"title\" value=\"\">");
    }

    #[test]
    fn count_class_walks_the_tree() {
        let node: Node = el("div")
            .child(el("div").class("chapter").child(el("div").class("chapter-title")))
            .child(el("div").class("chapter extra"))
            .into();
        assert_eq!(node.count_class("chapter"), 2);
        assert_eq!(node.count_class("chapter-title"), 1);
    }
}
