//! XMP packet reader: a minimal RDF/XML scanner.
//!
//! XMP serializes metadata as RDF/XML inside an `x:xmpmeta` wrapper. Simple
//! properties appear in two spellings, both of which are captured here:
//!
//! - attribute form: `<rdf:Description xmp:CreatorTool="...">`
//! - element form: `<xmp:CreatorTool>...</xmp:CreatorTool>`
//!
//! Array and struct properties (`rdf:Seq`, `rdf:parseType="Resource"` and
//! friends) are recorded as present with an empty value; their inner shape
//! is not modeled. Prefixes are resolved to namespace URIs through `xmlns`
//! declarations, so lookups are stable against packets that rename their
//! prefixes.

use crate::error::XmpError;
use crate::model::{XmpMeta, NS_RDF};
use std::collections::HashMap;

/// Parse the raw packet text (the bytes following the APP1 signature) into
/// an [`XmpMeta`] property map.
pub fn parse_packet(packet: &[u8]) -> Result<XmpMeta, XmpError> {
    let text = std::str::from_utf8(packet)
        .map_err(|_| XmpError::Malformed("XMP packet is not valid UTF-8".into()))?;
    let text = text.trim_start_matches('\u{feff}');

    let mut meta = XmpMeta::new();
    let mut prefixes: HashMap<String, String> = HashMap::new();
    // The xml: prefix is predefined and never declared in-document.
    prefixes.insert(
        "xml".to_string(),
        "http://www.w3.org/XML/1998/namespace".to_string(),
    );

    let mut stack: Vec<Frame> = Vec::new();
    // Index into `stack` of the innermost open property element, if any.
    let mut open_property: Option<usize> = None;
    let mut saw_rdf = false;

    for event in Tokenizer::new(text) {
        match event? {
            Event::Start(tag) => {
                handle_open(
                    &tag,
                    &mut prefixes,
                    &mut meta,
                    &mut stack,
                    &mut open_property,
                    &mut saw_rdf,
                )?;
            }
            Event::Empty(tag) => {
                handle_open(
                    &tag,
                    &mut prefixes,
                    &mut meta,
                    &mut stack,
                    &mut open_property,
                    &mut saw_rdf,
                )?;
                close_top(&mut meta, &mut stack, &mut open_property);
            }
            Event::End(name) => {
                match stack.last() {
                    Some(frame) if frame.raw_name == name => {}
                    _ => {
                        return Err(XmpError::Malformed(format!(
                            "mismatched closing tag </{name}>"
                        )))
                    }
                }
                close_top(&mut meta, &mut stack, &mut open_property);
            }
            Event::Text(chunk) => {
                if let Some(idx) = open_property {
                    // Text is only meaningful when it sits directly inside
                    // the property element.
                    if idx == stack.len() - 1 {
                        if let Some(capture) = stack[idx].capture.as_mut() {
                            if !capture.nested {
                                capture.text.push_str(&unescape(chunk));
                            }
                        }
                    }
                }
            }
        }
    }

    if !stack.is_empty() {
        return Err(XmpError::Malformed("unterminated element in packet".into()));
    }
    if !saw_rdf {
        return Err(XmpError::Malformed("packet carries no rdf:RDF element".into()));
    }
    Ok(meta)
}

struct Frame {
    raw_name: String,
    is_description: bool,
    capture: Option<Capture>,
}

struct Capture {
    ns: String,
    local: String,
    text: String,
    nested: bool,
}

fn handle_open(
    tag: &Tag<'_>,
    prefixes: &mut HashMap<String, String>,
    meta: &mut XmpMeta,
    stack: &mut Vec<Frame>,
    open_property: &mut Option<usize>,
    saw_rdf: &mut bool,
) -> Result<(), XmpError> {
    // Namespace declarations on this tag apply to the tag itself.
    for (name, value) in &tag.attrs {
        if let Some(prefix) = name.strip_prefix("xmlns:") {
            prefixes.insert(prefix.to_string(), unescape(value));
        } else if *name == "xmlns" {
            prefixes.insert(String::new(), unescape(value));
        }
    }

    let (ns, local) = resolve(tag.name, prefixes);
    let is_rdf = ns == NS_RDF;
    if is_rdf && local == "RDF" {
        *saw_rdf = true;
    }
    let is_description = is_rdf && local == "Description";

    // Opening anything below a property element means the property holds
    // structured content; it stays present-with-empty-value.
    if let Some(idx) = *open_property {
        if let Some(capture) = stack[idx].capture.as_mut() {
            capture.nested = true;
        }
    }

    if is_description {
        // Attribute-form simple properties.
        for (name, value) in &tag.attrs {
            if name.starts_with("xmlns") || *name == "about" {
                continue;
            }
            let (attr_ns, attr_local) = resolve(name, prefixes);
            if attr_ns.is_empty() || attr_ns == NS_RDF {
                continue;
            }
            meta.insert(&attr_ns, &attr_local, unescape(value));
        }
    }

    let parent_is_description = stack.last().is_some_and(|f| f.is_description);
    let capture = if parent_is_description && !is_rdf && !ns.is_empty() {
        Some(Capture {
            ns,
            local,
            text: String::new(),
            nested: false,
        })
    } else {
        None
    };

    stack.push(Frame {
        raw_name: tag.name.to_string(),
        is_description,
        capture,
    });
    if stack.last().is_some_and(|f| f.capture.is_some()) {
        *open_property = Some(stack.len() - 1);
    }
    Ok(())
}

fn close_top(meta: &mut XmpMeta, stack: &mut Vec<Frame>, open_property: &mut Option<usize>) {
    if let Some(frame) = stack.pop() {
        if let Some(capture) = frame.capture {
            let value = if capture.nested {
                String::new()
            } else {
                capture.text.trim().to_string()
            };
            meta.insert(&capture.ns, &capture.local, value);
        }
    }
    // Recompute the innermost open property after the pop.
    *open_property = stack.iter().rposition(|f| f.capture.is_some());
}

/// Split a qualified name and resolve its prefix to a namespace URI.
/// Unknown prefixes resolve to an empty namespace, which callers skip.
fn resolve(qname: &str, prefixes: &HashMap<String, String>) -> (String, String) {
    match qname.split_once(':') {
        Some((prefix, local)) => {
            let ns = prefixes.get(prefix).cloned().unwrap_or_default();
            (ns, local.to_string())
        }
        None => {
            let ns = prefixes.get("").cloned().unwrap_or_default();
            (ns, qname.to_string())
        }
    }
}

/// Resolve the five predefined entities and numeric character references.
fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest.find(';') else {
            out.push_str(rest);
            return out;
        };
        let entity = &rest[1..semi];
        match entity {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            _ => {
                let parsed = entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32);
                match parsed {
                    Some(c) => out.push(c),
                    // Unknown entity: keep it verbatim rather than guess.
                    None => out.push_str(&rest[..=semi]),
                }
            }
        }
        rest = &rest[semi + 1..];
    }
    out.push_str(rest);
    out
}

enum Event<'a> {
    Start(Tag<'a>),
    Empty(Tag<'a>),
    End(&'a str),
    Text(&'a str),
}

struct Tag<'a> {
    name: &'a str,
    attrs: Vec<(&'a str, &'a str)>,
}

struct Tokenizer<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn next_event(&mut self) -> Option<Result<Event<'a>, XmpError>> {
        loop {
            let rest = &self.text[self.pos..];
            if rest.is_empty() {
                return None;
            }
            let lt = match rest.find('<') {
                Some(i) => i,
                None => {
                    // Trailing text outside any tag (xpacket padding).
                    self.pos = self.text.len();
                    return None;
                }
            };
            if lt > 0 {
                let text = &rest[..lt];
                self.pos += lt;
                if !text.trim().is_empty() {
                    return Some(Ok(Event::Text(text)));
                }
                continue;
            }

            // rest starts with '<'
            if let Some(stripped) = rest.strip_prefix("<?") {
                match stripped.find("?>") {
                    Some(end) => {
                        self.pos += 2 + end + 2;
                        continue;
                    }
                    None => return Some(Err(malformed("unterminated processing instruction"))),
                }
            }
            if let Some(stripped) = rest.strip_prefix("<!--") {
                match stripped.find("-->") {
                    Some(end) => {
                        self.pos += 4 + end + 3;
                        continue;
                    }
                    None => return Some(Err(malformed("unterminated comment"))),
                }
            }
            if let Some(stripped) = rest.strip_prefix("<![CDATA[") {
                match stripped.find("]]>") {
                    Some(end) => {
                        let content = &stripped[..end];
                        self.pos += 9 + end + 3;
                        return Some(Ok(Event::Text(content)));
                    }
                    None => return Some(Err(malformed("unterminated CDATA section"))),
                }
            }
            if let Some(stripped) = rest.strip_prefix("<!") {
                match stripped.find('>') {
                    Some(end) => {
                        self.pos += 2 + end + 1;
                        continue;
                    }
                    None => return Some(Err(malformed("unterminated declaration"))),
                }
            }
            if let Some(stripped) = rest.strip_prefix("</") {
                match stripped.find('>') {
                    Some(end) => {
                        let name = stripped[..end].trim();
                        self.pos += 2 + end + 1;
                        return Some(Ok(Event::End(name)));
                    }
                    None => return Some(Err(malformed("unterminated closing tag"))),
                }
            }

            // Ordinary start tag; find '>' outside quoted attribute values.
            let inner = &rest[1..];
            let mut in_quote: Option<char> = None;
            let mut end = None;
            for (i, c) in inner.char_indices() {
                match in_quote {
                    Some(q) if c == q => in_quote = None,
                    Some(_) => {}
                    None => match c {
                        '"' | '\'' => in_quote = Some(c),
                        '>' => {
                            end = Some(i);
                            break;
                        }
                        _ => {}
                    },
                }
            }
            let Some(end) = end else {
                return Some(Err(malformed("unterminated start tag")));
            };
            let mut content = &inner[..end];
            self.pos += 1 + end + 1;
            let empty = content.ends_with('/');
            if empty {
                content = content[..content.len() - 1].trim_end();
            }
            return Some(match parse_tag(content) {
                Ok(tag) if empty => Ok(Event::Empty(tag)),
                Ok(tag) => Ok(Event::Start(tag)),
                Err(err) => Err(err),
            });
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Event<'a>, XmpError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event()
    }
}

fn malformed(msg: &str) -> XmpError {
    XmpError::Malformed(msg.to_string())
}

fn parse_tag(content: &str) -> Result<Tag<'_>, XmpError> {
    let content = content.trim();
    let name_end = content
        .find(|c: char| c.is_whitespace())
        .unwrap_or(content.len());
    let name = &content[..name_end];
    if name.is_empty() {
        return Err(malformed("empty tag name"));
    }

    let mut attrs = Vec::new();
    let mut rest = content[name_end..].trim_start();
    while !rest.is_empty() {
        let eq = rest
            .find('=')
            .ok_or_else(|| malformed("attribute without value"))?;
        let attr_name = rest[..eq].trim_end();
        if attr_name.is_empty() || attr_name.contains(char::is_whitespace) {
            return Err(malformed("invalid attribute name"));
        }
        let after_eq = rest[eq + 1..].trim_start();
        let quote = after_eq
            .chars()
            .next()
            .filter(|c| *c == '"' || *c == '\'')
            .ok_or_else(|| malformed("unquoted attribute value"))?;
        let value_body = &after_eq[1..];
        let close = value_body
            .find(quote)
            .ok_or_else(|| malformed("unterminated attribute value"))?;
        attrs.push((attr_name, &value_body[..close]));
        rest = value_body[close + 1..].trim_start();
    }

    Ok(Tag { name, attrs })
}
