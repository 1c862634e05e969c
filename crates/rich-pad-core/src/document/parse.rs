/// Lenient HTML fragment parser.
///
/// Covers the markup an editing surface produces: elements, void elements,
/// attributes in any quoting style, comments and character references.
/// Stray end tags are dropped, unclosed elements are closed at the end of
/// input, and a lone `<` that does not start a tag is kept as text.
use super::serialize::{is_raw_text, is_void};
use super::{Document, Element, NodeId};

pub(super) fn parse_fragment(html: &str) -> Document {
    let mut parser = Parser {
        src: html,
        pos: 0,
        doc: Document::new(),
        stack: Vec::new(),
    };
    let root = parser.doc.root();
    parser.stack.push(root);
    parser.run();
    parser.doc
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    doc: Document,
    /// Open elements; the root is always at the bottom.
    stack: Vec<NodeId>,
}

impl Parser<'_> {
    fn bytes(&self) -> &[u8] {
        self.src.as_bytes()
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or_else(|| self.doc.root())
    }

    fn run(&mut self) {
        let src = self.src;
        let mut text_start = 0;
        while self.pos < src.len() {
            if src.as_bytes()[self.pos] != b'<' {
                self.pos += 1;
                continue;
            }
            let rest = &src[self.pos..];
            let next = rest.as_bytes().get(1).copied();

            if rest.starts_with("<!--") {
                self.flush_text(text_start, self.pos);
                self.comment();
            } else if matches!(next, Some(b'!') | Some(b'?')) {
                // Doctype or processing instruction: dropped.
                self.flush_text(text_start, self.pos);
                self.skip_past(b'>');
            } else if next == Some(b'/')
                && rest.as_bytes().get(2).is_some_and(u8::is_ascii_alphabetic)
            {
                self.flush_text(text_start, self.pos);
                self.end_tag();
            } else if next.is_some_and(|b| b.is_ascii_alphabetic()) {
                self.flush_text(text_start, self.pos);
                self.start_tag();
            } else {
                self.pos += 1;
                continue;
            }
            text_start = self.pos;
        }
        self.flush_text(text_start, self.src.len());
    }

    fn flush_text(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let text = decode_entities(&self.src[start..end]);
        let node = self.doc.create_text(text);
        let parent = self.current();
        self.doc.append_child(parent, node);
    }

    fn skip_past(&mut self, byte: u8) {
        match self.bytes()[self.pos..].iter().position(|&b| b == byte) {
            Some(i) => self.pos += i + 1,
            None => self.pos = self.src.len(),
        }
    }

    fn comment(&mut self) {
        let body_start = self.pos + 4;
        let (body_end, next) = match self.src[body_start..].find("-->") {
            Some(i) => (body_start + i, body_start + i + 3),
            None => (self.src.len(), self.src.len()),
        };
        let node = self.doc.create_comment(&self.src[body_start..body_end]);
        let parent = self.current();
        self.doc.append_child(parent, node);
        self.pos = next;
    }

    fn read_name(&mut self) -> String {
        let start = self.pos;
        while self.pos < self.src.len() {
            let b = self.bytes()[self.pos];
            if b.is_ascii_whitespace() || b == b'/' || b == b'>' || b == b'=' {
                break;
            }
            self.pos += 1;
        }
        self.src[start..self.pos].to_ascii_lowercase()
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.src.len() && self.bytes()[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn end_tag(&mut self) {
        self.pos += 2;
        let name = self.read_name();
        self.skip_past(b'>');
        self.close(&name);
    }

    /// Pops open elements up to and including the nearest `name`.
    fn close(&mut self, name: &str) {
        let found = self
            .stack
            .iter()
            .enumerate()
            .skip(1)
            .rev()
            .find(|(_, id)| self.doc.is_element(**id, name))
            .map(|(i, _)| i);
        if let Some(i) = found {
            self.stack.truncate(i);
        }
    }

    fn start_tag(&mut self) {
        self.pos += 1;
        let name = self.read_name();
        let mut element = Element::new(&name);
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            let Some(&b) = self.bytes().get(self.pos) else {
                break;
            };
            match b {
                b'>' => {
                    self.pos += 1;
                    break;
                }
                b'/' => {
                    self.pos += 1;
                    if self.bytes().get(self.pos) == Some(&b'>') {
                        self_closing = true;
                    }
                }
                _ => {
                    let attr = self.read_name();
                    if attr.is_empty() {
                        // Stray `=` or similar; skip it.
                        self.pos += 1;
                        continue;
                    }
                    let value = self.attr_value();
                    if element.attr(&attr).is_none() {
                        element.attrs.push((attr, value));
                    }
                }
            }
        }

        let node = self.doc.create_element(element);
        let parent = self.current();
        self.doc.append_child(parent, node);

        if is_void(&name) || self_closing {
            return;
        }
        if is_raw_text(&name) {
            self.raw_text(node, &name);
            return;
        }
        self.stack.push(node);
    }

    fn attr_value(&mut self) -> String {
        self.skip_whitespace();
        if self.bytes().get(self.pos) != Some(&b'=') {
            return String::new();
        }
        self.pos += 1;
        self.skip_whitespace();
        let Some(&quote) = self.bytes().get(self.pos) else {
            return String::new();
        };
        if quote == b'"' || quote == b'\'' {
            let start = self.pos + 1;
            let end = self.bytes()[start..]
                .iter()
                .position(|&b| b == quote)
                .map_or(self.src.len(), |i| start + i);
            self.pos = (end + 1).min(self.src.len());
            return decode_entities(&self.src[start..end]);
        }
        let start = self.pos;
        while self.pos < self.src.len() {
            let b = self.bytes()[self.pos];
            if b.is_ascii_whitespace() || b == b'>' {
                break;
            }
            self.pos += 1;
        }
        decode_entities(&self.src[start..self.pos])
    }

    /// Consumes everything up to `</name` as a single unescaped text node.
    fn raw_text(&mut self, node: NodeId, name: &str) {
        let end = self.find_end_tag(name);
        if end > self.pos {
            let text = self.doc.create_text(&self.src[self.pos..end]);
            self.doc.append_child(node, text);
        }
        self.pos = end;
        if self.pos < self.src.len() {
            self.skip_past(b'>');
        }
    }

    /// Offset of the next `</name` (any case) from the current position,
    /// or the end of input.
    fn find_end_tag(&self, name: &str) -> usize {
        let bytes = self.bytes();
        let name = name.as_bytes();
        let mut from = self.pos;
        while let Some(i) = bytes[from..].iter().position(|&b| b == b'<') {
            let start = from + i;
            let tag = start + 2;
            if bytes.get(start + 1) == Some(&b'/')
                && bytes
                    .get(tag..tag + name.len())
                    .is_some_and(|t| t.eq_ignore_ascii_case(name))
            {
                return start;
            }
            from = start + 1;
        }
        self.src.len()
    }
}

/// Decodes character references. Unknown references are kept verbatim.
pub(crate) fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .char_indices()
            .take(12)
            .find(|&(_, c)| c == ';')
            .and_then(|(semi, _)| decode_reference(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(html: &str) -> String {
        Document::parse(html).to_html()
    }

    #[test]
    fn test_simple_markup_is_canonical() {
        let html = "<p>Hello <b>world</b></p><p><img src=\"a.png\" width=\"10\"></p>";
        assert_eq!(roundtrip(html), html);
    }

    #[test]
    fn test_void_and_self_closing() {
        assert_eq!(roundtrip("<p>a<br>b<br/>c<hr /></p>"), "<p>a<br>b<br>c<hr></p>");
        assert_eq!(roundtrip("<span/>x"), "<span></span>x");
    }

    #[test]
    fn test_attribute_quoting_styles() {
        assert_eq!(
            roundtrip("<IMG SRC='a.png' width=10 hidden alt=\"x > y\">"),
            "<img src=\"a.png\" width=\"10\" hidden=\"\" alt=\"x > y\">"
        );
    }

    #[test]
    fn test_duplicate_attribute_keeps_first() {
        assert_eq!(roundtrip("<a href=\"1\" href=\"2\">x</a>"), "<a href=\"1\">x</a>");
    }

    #[test]
    fn test_entities_decoded_and_reescaped() {
        let doc = Document::parse("<p>a &amp; b &lt;c&gt; &#039;q&#39; &#x41; &bogus; &</p>");
        assert_eq!(doc.text_content(doc.root()), "a & b <c> 'q' A &bogus; &");
        assert_eq!(
            doc.to_html(),
            "<p>a &amp; b &lt;c&gt; 'q' A &amp;bogus; &amp;</p>"
        );
    }

    #[test]
    fn test_unclosed_and_stray_tags() {
        assert_eq!(roundtrip("<div><p>a</div>b</span>"), "<div><p>a</p></div>b");
        assert_eq!(roundtrip("<b><i>x</b>y"), "<b><i>x</i></b>y");
        assert_eq!(roundtrip("<p>open"), "<p>open</p>");
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        assert_eq!(roundtrip("1 < 2 <3"), "1 &lt; 2 &lt;3");
    }

    #[test]
    fn test_doctype_dropped_comment_kept() {
        assert_eq!(roundtrip("<!DOCTYPE html><!--c--><p>x</p>"), "<!--c--><p>x</p>");
        assert_eq!(roundtrip("<p>x<!-- open"), "<p>x<!-- open--></p>");
    }

    #[test]
    fn test_raw_text_elements() {
        assert_eq!(
            roundtrip("<style>p > a { color: red }</style><p>x</p>"),
            "<style>p > a { color: red }</style><p>x</p>"
        );
    }

    #[test]
    fn test_raw_text_end_tag_any_case() {
        assert_eq!(
            roundtrip("<script>if (a </b) { x() }</SCRIPT><p>é</p>"),
            "<script>if (a </b) { x() }</script><p>é</p>"
        );
        assert_eq!(roundtrip("<style>unterminated"), "<style>unterminated</style>");
    }

    #[test]
    fn test_many_raw_text_elements() {
        let html = "<script>x < 1</script>".repeat(5_000);
        let doc = Document::parse(&html);
        assert_eq!(doc.children(doc.root()).len(), 5_000);
        assert_eq!(doc.to_html(), html);
    }

    #[test]
    fn test_unicode_text() {
        assert_eq!(roundtrip("<p>héllo — 世界</p>"), "<p>héllo — 世界</p>");
    }

    #[test]
    fn test_empty_input() {
        let doc = Document::parse("");
        assert!(doc.children(doc.root()).is_empty());
        assert_eq!(doc.to_html(), "");
    }
}
