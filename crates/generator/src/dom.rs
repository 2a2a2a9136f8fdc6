//! A small HTML tree: enough to parse hand-written page templates, edit
//! elements in place and write the result back out.
//!
//! Text and attribute values are kept exactly as written in the source
//! (entities are not decoded), so untouched parts of a template survive a
//! parse/serialize cycle unchanged apart from attribute quoting.

/// Elements that never have children or a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is not parsed as markup
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Elements whose end tag may be left out of the source
const OPTIONAL_END_ELEMENTS: &[&str] = &["p", "li", "dt", "dd", "option", "tr", "td", "th"];

/// Start tags that end an open `<p>`
const P_CLOSERS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hgroup", "hr", "li", "main", "menu", "nav", "ol", "p", "pre", "section", "table", "ul",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Raw source text, entities left as written
    Text(String),
    Comment(String),
    /// `<!DOCTYPE ...>` and other `<!`/`<?` declarations, verbatim
    Doctype(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<Attribute>,
    pub children: Vec<Node>,
    /// Written as `<tag/>` in the source
    pub self_closing: bool,
    /// The source relied on an implied end tag, so none is written back
    pub end_tag_omitted: bool,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
            self_closing: false,
            end_tag_omitted: false,
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }

    /// Attribute value; a bare attribute reads as `""`
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    /// Case-insensitive attribute comparison, for `rel`/`type` style values
    pub fn attr_eq(&self, name: &str, expected: &str) -> bool {
        self.attr(name)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case(expected))
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// Set an attribute from an unescaped value, replacing it in place if present
    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.set_attr_raw(name, &escape_attr(value));
    }

    /// Set an attribute to a value that is already valid attribute markup
    pub fn set_attr_raw(&mut self, name: &str, raw: &str) {
        let name = name.to_ascii_lowercase();
        match self.attrs.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = Some(raw.to_string()),
            None => self.attrs.push(Attribute {
                name,
                value: Some(raw.to_string()),
            }),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|a| a.name != name);
    }

    /// Concatenated text of all descendants, as written in the source
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Replace the children with a single escaped text node
    pub fn set_text(&mut self, text: &str) {
        self.set_raw_text(&escape_text(text));
    }

    /// Replace the children with text that is written out verbatim
    pub fn set_raw_text(&mut self, raw: &str) {
        self.self_closing = false;
        self.children = if raw.is_empty() {
            Vec::new()
        } else {
            vec![Node::Text(raw.to_string())]
        };
    }

    /// Replace the children with a parsed markup fragment
    pub fn set_inner_html(&mut self, html: &str) {
        self.self_closing = false;
        self.children = parse_fragment(html);
    }

    pub fn inner_html(&self) -> String {
        serialize(&self.children)
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => collect_text(&el.children, out),
            Node::Comment(_) | Node::Doctype(_) => {}
        }
    }
}

/// A parsed page
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Document {
            nodes: parse_fragment(html),
        }
    }

    pub fn to_html(&self) -> String {
        serialize(&self.nodes)
    }

    /// First element (document order) matching `pred`
    pub fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        find_in(&self.nodes, pred)
    }

    pub fn find_mut(&mut self, pred: &dyn Fn(&Element) -> bool) -> Option<&mut Element> {
        find_in_mut(&mut self.nodes, pred)
    }

    pub fn first_mut(&mut self, tag: &str) -> Option<&mut Element> {
        self.find_mut(&|el| el.is(tag))
    }

    pub fn element_by_id(&self, id: &str) -> Option<&Element> {
        self.find(&|el| el.id() == Some(id))
    }

    pub fn element_by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.find_mut(&|el| el.id() == Some(id))
    }

    /// Visit every element in document order
    pub fn for_each_element(&self, f: &mut dyn FnMut(&Element)) {
        visit(&self.nodes, f);
    }

    pub fn for_each_element_mut(&mut self, f: &mut dyn FnMut(&mut Element)) {
        visit_mut(&mut self.nodes, f);
    }

    pub fn count(&self, pred: &dyn Fn(&Element) -> bool) -> usize {
        let mut n = 0;
        self.for_each_element(&mut |el| {
            if pred(el) {
                n += 1;
            }
        });
        n
    }

    /// Detach every element matching `pred` together with the indentation
    /// that preceded it. Returns how many elements were removed.
    pub fn remove_elements(&mut self, pred: &dyn Fn(&Element) -> bool) -> usize {
        let mut removed = 0;
        remove_in(&mut self.nodes, pred, &mut removed);
        removed
    }

    /// Append nodes at the end of `<head>`, each on its own indented line.
    /// Returns false when the document has no head.
    pub fn append_to_head(&mut self, nodes: Vec<Node>) -> bool {
        let Some(head) = self.first_mut("head") else {
            return false;
        };

        // Keep the whitespace before `</head>` last
        let has_trailing =
            matches!(head.children.last(), Some(Node::Text(t)) if t.trim().is_empty());
        let trailing = if has_trailing {
            head.children.pop()
        } else {
            None
        };

        for node in nodes {
            head.children.push(Node::Text("\n    ".to_string()));
            head.children.push(node);
        }

        head.children
            .push(trailing.unwrap_or_else(|| Node::Text("\n".to_string())));
        true
    }
}

fn find_in<'a>(nodes: &'a [Node], pred: &dyn Fn(&Element) -> bool) -> Option<&'a Element> {
    for node in nodes {
        if let Node::Element(el) = node {
            if pred(el) {
                return Some(el);
            }
            if let Some(found) = find_in(&el.children, pred) {
                return Some(found);
            }
        }
    }
    None
}

fn find_in_mut<'a>(
    nodes: &'a mut [Node],
    pred: &dyn Fn(&Element) -> bool,
) -> Option<&'a mut Element> {
    for node in nodes.iter_mut() {
        if let Node::Element(el) = node {
            if pred(el) {
                return Some(el);
            }
            if let Some(found) = find_in_mut(&mut el.children, pred) {
                return Some(found);
            }
        }
    }
    None
}

fn visit(nodes: &[Node], f: &mut dyn FnMut(&Element)) {
    for node in nodes {
        if let Node::Element(el) = node {
            f(el);
            visit(&el.children, f);
        }
    }
}

fn visit_mut(nodes: &mut [Node], f: &mut dyn FnMut(&mut Element)) {
    for node in nodes.iter_mut() {
        if let Node::Element(el) = node {
            f(el);
            visit_mut(&mut el.children, f);
        }
    }
}

fn remove_in(nodes: &mut Vec<Node>, pred: &dyn Fn(&Element) -> bool, removed: &mut usize) {
    let mut kept: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes.drain(..) {
        match node {
            Node::Element(el) if pred(&el) => {
                *removed += 1;
                if matches!(kept.last(), Some(Node::Text(t)) if t.trim().is_empty()) {
                    kept.pop();
                }
            }
            Node::Element(mut el) => {
                remove_in(&mut el.children, pred, removed);
                kept.push(Node::Element(el));
            }
            other => kept.push(other),
        }
    }
    *nodes = kept;
}

/// Escape text for use as element content
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape text for use inside a double-quoted attribute
pub fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Parse an HTML document or fragment into nodes.
///
/// Never fails: stray closing tags are dropped, unclosed elements are
/// closed at the end of input and an unterminated tag is kept as text.
/// A `<li>`, `<p>` and the like ends where HTML implies it does, and keeps
/// its missing end tag missing on output.
pub fn parse_fragment(html: &str) -> Vec<Node> {
    let mut root: Vec<Node> = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let bytes = html.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        let rest = &html[pos..];

        if rest.starts_with("<!--") {
            let (content, consumed) = match rest[4..].find("-->") {
                Some(end) => (&rest[4..4 + end], 4 + end + 3),
                None => (&rest[4..], rest.len()),
            };
            push_node(&mut stack, &mut root, Node::Comment(content.to_string()));
            pos += consumed;
            continue;
        }

        if rest.starts_with("<!") || rest.starts_with("<?") {
            let consumed = rest.find('>').map_or(rest.len(), |i| i + 1);
            push_node(&mut stack, &mut root, Node::Doctype(rest[..consumed].to_string()));
            pos += consumed;
            continue;
        }

        if rest.starts_with("</") && rest[2..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            let consumed = rest.find('>').map_or(rest.len(), |i| i + 1);
            let name = rest[2..consumed]
                .split(|c: char| c.is_ascii_whitespace() || c == '>')
                .next()
                .unwrap_or_default()
                .to_ascii_lowercase();
            close_element(&mut stack, &mut root, &name);
            pos += consumed;
            continue;
        }

        if rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            if let Some((mut element, consumed)) = parse_start_tag(rest) {
                pos += consumed;
                close_implied(&mut stack, &mut root, &element.tag);

                if element.self_closing || element.is_void() {
                    push_node(&mut stack, &mut root, Node::Element(element));
                } else if RAW_TEXT_ELEMENTS.contains(&element.tag.as_str()) {
                    let (raw, consumed) = read_raw_text(&html[pos..], &element.tag);
                    if !raw.is_empty() {
                        element.children.push(Node::Text(raw.to_string()));
                    }
                    pos += consumed;
                    push_node(&mut stack, &mut root, Node::Element(element));
                } else {
                    stack.push(element);
                }
                continue;
            }
        }

        // Text up to the next '<' (a '<' that opened nothing is text too)
        let next = if rest.starts_with('<') {
            rest[1..].find('<').map_or(rest.len(), |i| i + 1)
        } else {
            rest.find('<').unwrap_or(rest.len())
        };
        push_node(&mut stack, &mut root, Node::Text(rest[..next].to_string()));
        pos += next;
    }

    while let Some(element) = stack.pop() {
        push_node(&mut stack, &mut root, Node::Element(implicitly_closed(element)));
    }

    root
}

fn push_node(stack: &mut [Element], root: &mut Vec<Node>, node: Node) {
    let target = match stack.last_mut() {
        Some(parent) => &mut parent.children,
        None => root,
    };
    if let Node::Text(text) = &node
        && let Some(Node::Text(prev)) = target.last_mut()
    {
        prev.push_str(text);
        return;
    }
    target.push(node);
}

fn close_element(stack: &mut Vec<Element>, root: &mut Vec<Node>, name: &str) {
    let Some(index) = stack.iter().rposition(|el| el.tag == name) else {
        return;
    };
    while stack.len() > index + 1 {
        if let Some(element) = stack.pop() {
            push_node(stack, root, Node::Element(implicitly_closed(element)));
        }
    }
    if let Some(element) = stack.pop() {
        push_node(stack, root, Node::Element(element));
    }
}

/// Close open elements that the start tag `next` ends without an end tag
fn close_implied(stack: &mut Vec<Element>, root: &mut Vec<Node>, next: &str) {
    while let Some(open) = stack.last() {
        let ends = match open.tag.as_str() {
            "p" => P_CLOSERS.contains(&next),
            "li" => next == "li",
            "dt" | "dd" => matches!(next, "dt" | "dd"),
            "option" => matches!(next, "option" | "optgroup"),
            "tr" => next == "tr",
            "td" | "th" => matches!(next, "td" | "th" | "tr"),
            _ => false,
        };
        if !ends {
            return;
        }
        if let Some(element) = stack.pop() {
            push_node(stack, root, Node::Element(implicitly_closed(element)));
        }
    }
}

/// Mark an element closed by something other than its own end tag
fn implicitly_closed(mut element: Element) -> Element {
    if OPTIONAL_END_ELEMENTS.contains(&element.tag.as_str()) {
        element.end_tag_omitted = true;
    }
    element
}

/// Parse `<tag attr=...>`; returns the element and bytes consumed, or None
/// when the tag never terminates.
fn parse_start_tag(src: &str) -> Option<(Element, usize)> {
    let bytes = src.as_bytes();
    let mut pos = 1;
    while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() && bytes[pos] != b'>' && bytes[pos] != b'/' {
        pos += 1;
    }
    let mut element = Element::new(&src[1..pos]);

    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            return None;
        }
        match bytes[pos] {
            b'>' => return Some((element, pos + 1)),
            b'/' if bytes.get(pos + 1) == Some(&b'>') => {
                element.self_closing = true;
                return Some((element, pos + 2));
            }
            b'/' => {
                pos += 1;
                continue;
            }
            _ => {}
        }

        let name_start = pos;
        while pos < bytes.len()
            && !bytes[pos].is_ascii_whitespace()
            && !matches!(bytes[pos], b'=' | b'>' | b'/')
        {
            pos += 1;
        }
        let name = src[name_start..pos].to_ascii_lowercase();

        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }

        let value = if bytes.get(pos) == Some(&b'=') {
            pos += 1;
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            match bytes.get(pos) {
                Some(&quote) if quote == b'"' || quote == b'\'' => {
                    let start = pos + 1;
                    let end = src[start..].find(quote as char)? + start;
                    pos = end + 1;
                    Some(src[start..end].to_string())
                }
                Some(_) => {
                    let start = pos;
                    while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() && bytes[pos] != b'>' {
                        pos += 1;
                    }
                    Some(src[start..pos].to_string())
                }
                None => return None,
            }
        } else {
            None
        };

        if !name.is_empty() && !element.has_attr(&name) {
            element.attrs.push(Attribute { name, value });
        }
    }
}

/// Content of a raw-text element up to its closing tag (case-insensitive)
fn read_raw_text<'a>(src: &'a str, tag: &str) -> (&'a str, usize) {
    let closing = format!("</{}", tag);
    let lower = src.to_ascii_lowercase();
    let mut search = 0;
    while let Some(found) = lower[search..].find(&closing) {
        let start = search + found;
        let after = start + closing.len();
        // `</scripts` is not `</script`
        if lower[after..].starts_with(|c: char| c == '>' || c.is_ascii_whitespace()) {
            let end = lower[after..].find('>').map_or(src.len(), |i| after + i + 1);
            return (&src[..start], end);
        }
        search = after;
    }
    (src, src.len())
}

/// Serialize nodes back to HTML
pub fn serialize(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        serialize_node(node, &mut out);
    }
    out
}

fn serialize_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for attr in &el.attrs {
                out.push(' ');
                out.push_str(&attr.name);
                if let Some(value) = &attr.value {
                    out.push_str("=\"");
                    out.push_str(&value.replace('"', "&quot;"));
                    out.push('"');
                }
            }
            if el.self_closing && el.children.is_empty() {
                out.push_str(" />");
                return;
            }
            out.push('>');
            if el.is_void() {
                return;
            }
            for child in &el.children {
                serialize_node(child, out);
            }
            if el.end_tag_omitted {
                return;
            }
            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
        }
        Node::Text(text) => out.push_str(text),
        Node::Comment(content) => {
            out.push_str("<!--");
            out.push_str(content);
            out.push_str("-->");
        }
        Node::Doctype(raw) => out.push_str(raw),
    }
}
