//! Tolerant markup tree builder.
//!
//! Nodes live in an arena and are numbered in document order. Unbalanced close
//! tags are tolerated the way browsers tolerate them; input that ends inside a
//! tag, comment or quoted attribute is reported as malformed.

use crate::error::{ParseError, Result};

pub type NodeId = usize;

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    pub const ROOT: NodeId = 0;

    pub fn parse(input: &str) -> Result<Self> {
        Builder::new(input).run()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.tag(id).is_some()
    }

    /// Every element in document order.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).filter(move |id| *id != Self::ROOT && self.is_element(*id))
    }

    /// Parent chain of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Descendants of `id` (excluding itself) in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next].children.iter().rev().copied());
        }
        out
    }

    pub fn descendant_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(id)
            .into_iter()
            .filter(move |child| self.is_element(*child))
    }

    /// Non-empty text runs under `id`, whitespace collapsed.
    pub fn text_lines(&self, id: NodeId) -> Vec<String> {
        let mut lines = Vec::new();
        if let NodeKind::Text(text) = &self.nodes[id].kind {
            push_line(&mut lines, text);
        }
        for child in self.descendants(id) {
            if let NodeKind::Text(text) = &self.nodes[child].kind {
                push_line(&mut lines, text);
            }
        }
        lines
    }

    pub fn text(&self, id: NodeId) -> String {
        self.text_lines(id).join(" ")
    }
}

fn push_line(lines: &mut Vec<String>, text: &str) {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if !collapsed.is_empty() {
        lines.push(collapsed);
    }
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next.filter(|id| *id != Document::ROOT)?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').filter(|end| *end <= 10).and_then(|end| {
            let entity = &tail[1..end];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" => Some(' '),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            }?;
            Some((ch, end + 1))
        });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

struct Builder<'a> {
    src: &'a str,
    pos: usize,
    nodes: Vec<Node>,
    open: Vec<NodeId>,
}

impl<'a> Builder<'a> {
    fn new(src: &'a str) -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Element {
                tag: "#root".to_string(),
                attrs: Vec::new(),
            },
        };
        Self {
            src,
            pos: 0,
            nodes: vec![root],
            open: vec![Document::ROOT],
        }
    }

    fn run(mut self) -> Result<Document> {
        let src = self.src;
        while self.pos < src.len() {
            let rest = &src[self.pos..];
            if rest.starts_with("<!--") {
                let end = rest[4..]
                    .find("-->")
                    .ok_or_else(|| self.malformed("unterminated comment"))?;
                self.pos += 4 + end + 3;
            } else if rest.starts_with("</") {
                self.close_tag()?;
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                let end = rest
                    .find('>')
                    .ok_or_else(|| self.malformed("unterminated declaration"))?;
                self.pos += end + 1;
            } else if rest.starts_with('<')
                && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic())
            {
                self.open_tag()?;
            } else {
                self.text();
            }
        }
        Ok(Document { nodes: self.nodes })
    }

    fn malformed(&self, what: &str) -> ParseError {
        ParseError::MalformedDocument(format!("{what} at byte {}", self.pos))
    }

    fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or(Document::ROOT)
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let parent = self.current();
        let id = self.nodes.len();
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        self.nodes[parent].children.push(id);
        id
    }

    fn text(&mut self) {
        let src = self.src;
        let rest = &src[self.pos..];
        // A lone '<' that does not start a tag is plain text.
        let skip = usize::from(rest.starts_with('<'));
        let len = rest[skip..].find('<').map(|i| i + skip).unwrap_or(rest.len());
        let raw = &rest[..len];
        self.pos += len;
        if !raw.trim().is_empty() {
            self.push(NodeKind::Text(decode_entities(raw)));
        }
    }

    fn close_tag(&mut self) -> Result<()> {
        let src = self.src;
        let rest = &src[self.pos..];
        let end = rest
            .find('>')
            .ok_or_else(|| self.malformed("unterminated closing tag"))?;
        let name = rest[2..end].trim().to_ascii_lowercase();
        self.pos += end + 1;

        // Stray close tags with no open counterpart are ignored.
        let matching = self
            .open
            .iter()
            .rposition(|id| *id != Document::ROOT && self.tag_of(*id) == name);
        if let Some(depth) = matching {
            self.open.truncate(depth);
        }
        Ok(())
    }

    fn tag_of(&self, id: NodeId) -> &str {
        match &self.nodes[id].kind {
            NodeKind::Element { tag, .. } => tag,
            NodeKind::Text(_) => "",
        }
    }

    fn open_tag(&mut self) -> Result<()> {
        let src = self.src;
        let bytes = src.as_bytes();
        let mut i = self.pos + 1;
        let name_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && !matches!(bytes[i], b'>' | b'/')
        {
            i += 1;
        }
        let tag = src[name_start..i].to_ascii_lowercase();
        let mut attrs = Vec::new();
        let mut self_closing = false;

        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                return Err(self.malformed("unterminated tag"));
            }
            match bytes[i] {
                b'>' => {
                    i += 1;
                    break;
                }
                b'/' => {
                    self_closing = true;
                    i += 1;
                    continue;
                }
                _ => {}
            }

            let key_start = i;
            while i < bytes.len()
                && !bytes[i].is_ascii_whitespace()
                && !matches!(bytes[i], b'=' | b'>' | b'/')
            {
                i += 1;
            }
            let key = src[key_start..i].to_ascii_lowercase();
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }

            let mut value = String::new();
            if i < bytes.len() && bytes[i] == b'=' {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                if i < bytes.len() && matches!(bytes[i], b'"' | b'\'') {
                    let quote = bytes[i];
                    let value_start = i + 1;
                    let close = bytes[value_start..]
                        .iter()
                        .position(|b| *b == quote)
                        .ok_or_else(|| self.malformed("unterminated attribute value"))?;
                    value = decode_entities(&src[value_start..value_start + close]);
                    i = value_start + close + 1;
                } else {
                    let value_start = i;
                    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                        i += 1;
                    }
                    value = decode_entities(&src[value_start..i]);
                }
            }
            if !key.is_empty() {
                self_closing = false;
                attrs.push((key, value));
            }
        }

        self.pos = i;
        let is_void = VOID_TAGS.contains(&tag.as_str());
        let is_raw = RAW_TEXT_TAGS.contains(&tag.as_str());
        let id = self.push(NodeKind::Element {
            tag: tag.clone(),
            attrs,
        });

        if is_raw {
            let closing = format!("</{tag}");
            let rest = &src[self.pos..];
            let skip = rest
                .to_ascii_lowercase()
                .find(&closing)
                .unwrap_or(rest.len());
            self.pos += skip;
            self.open.push(id);
        } else if !is_void && !self_closing {
            self.open.push(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_tree_with_attributes() {
        let doc = Document::parse(
            r#"<div class="card big" data-course="Git"><p>Belajar &amp; Git</p><img src="a.png"></div>"#,
        )
        .unwrap();
        let div = doc.elements().next().unwrap();
        assert_eq!(doc.tag(div), Some("div"));
        assert!(doc.has_class(div, "big"));
        assert_eq!(doc.attr(div, "data-course"), Some("Git"));
        assert_eq!(doc.text(div), "Belajar & Git");

        let img = doc
            .descendant_elements(div)
            .find(|id| doc.tag(*id) == Some("img"))
            .unwrap();
        assert_eq!(doc.attr(img, "src"), Some("a.png"));
        assert_eq!(doc.ancestors(img).collect::<Vec<_>>(), vec![div]);
    }

    #[test]
    fn tolerates_stray_and_mismatched_close_tags() {
        let doc = Document::parse("<div><span>a</div></p><b>c</b>").unwrap();
        let tags: Vec<_> = doc.elements().filter_map(|id| doc.tag(id)).collect();
        assert_eq!(tags, vec!["div", "span", "b"]);
        let b = doc.elements().last().unwrap();
        assert_eq!(doc.parent(b), Some(Document::ROOT));
    }

    #[test]
    fn truncated_input_is_malformed() {
        assert!(matches!(
            Document::parse("<div class=\"x"),
            Err(ParseError::MalformedDocument(_))
        ));
        assert!(matches!(
            Document::parse("<div><!-- never closed"),
            Err(ParseError::MalformedDocument(_))
        ));
        assert!(matches!(
            Document::parse("<div"),
            Err(ParseError::MalformedDocument(_))
        ));
    }

    #[test]
    fn script_bodies_are_not_text() {
        let doc = Document::parse("<script>if (a < b) {}</script><p>x</p>").unwrap();
        assert_eq!(doc.text(Document::ROOT), "x");
    }

    #[test]
    fn decodes_numeric_entities() {
        assert_eq!(decode_entities("A&#39;s &#x41; &bogus"), "A's A &bogus");
    }
}
