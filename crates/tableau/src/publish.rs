//! Multipart publishing bodies.
//!
//! Publishing a workbook or datasource sends `multipart/mixed` with two
//! parts: a `request_payload` XML document describing the content, and the
//! packaged file itself.

use std::fmt::Write as _;

/// Minimal XML element for `tsRequest` documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    /// Add the attribute only when `value` is set.
    pub fn attr_opt(self, key: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.attr(key, v),
            None => self,
        }
    }

    pub fn child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            let _ = write!(out, " {key}=\"{}\"", escape_xml(value));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            child.render_into(out);
        }
        let _ = write!(out, "</{}>", self.name);
    }
}

/// Escape text for use inside a double-quoted XML attribute.
pub fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

struct Part {
    disposition: String,
    content_type: &'static str,
    body: Vec<u8>,
}

/// `multipart/mixed` body builder.
#[derive(Default)]
pub struct Multipart {
    parts: Vec<Part>,
}

impl Multipart {
    pub fn new() -> Self {
        Self::default()
    }

    /// The XML `request_payload` part.
    pub fn payload(mut self, document: &XmlElement) -> Self {
        self.parts.push(Part {
            disposition: "name=\"request_payload\"".into(),
            content_type: "application/xml",
            body: document.render().into_bytes(),
        });
        self
    }

    /// A file part, e.g. `tableau_workbook`.
    pub fn file(mut self, name: &str, filename: &str, content: Vec<u8>) -> Self {
        self.parts.push(Part {
            disposition: format!(
                "name=\"{name}\"; filename=\"{}\"",
                filename.replace('"', "")
            ),
            content_type: "application/octet-stream",
            body: content,
        });
        self
    }

    /// Boundary derived from the content so it cannot collide with it in practice.
    fn boundary(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for part in &self.parts {
            hasher.update(part.disposition.as_bytes());
            hasher.update(&part.body);
        }
        let hash = hasher.finalize().to_hex();
        format!("tableau-{}", &hash.as_str()[..32])
    }

    /// Encode the body; returns `(bytes, content_type)`.
    pub fn build(self) -> (Vec<u8>, String) {
        let boundary = self.boundary();
        let mut out = Vec::new();
        for part in self.parts {
            out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            out.extend_from_slice(format!("Content-Disposition: {}\r\n", part.disposition).as_bytes());
            out.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
            out.extend_from_slice(&part.body);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        (out, format!("multipart/mixed; boundary={boundary}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_nested() {
        let doc = XmlElement::new("tsRequest").child(
            XmlElement::new("workbook")
                .attr("name", "Sales")
                .attr("showTabs", "true")
                .child(XmlElement::new("project").attr("id", "P1")),
        );
        assert_eq!(
            doc.render(),
            r#"<tsRequest><workbook name="Sales" showTabs="true"><project id="P1"/></workbook></tsRequest>"#
        );
    }

    #[test]
    fn test_escape_attribute() {
        let doc = XmlElement::new("workbook").attr("name", r#"Q1 & "Q2" <draft>"#);
        assert_eq!(
            doc.render(),
            r#"<workbook name="Q1 &amp; &quot;Q2&quot; &lt;draft&gt;"/>"#
        );
    }

    #[test]
    fn test_attr_opt() {
        let doc = XmlElement::new("w").attr_opt("a", None).attr_opt("b", Some("x"));
        assert_eq!(doc.render(), r#"<w b="x"/>"#);
    }

    #[test]
    fn test_multipart_layout() {
        let (body, content_type) = Multipart::new()
            .payload(&XmlElement::new("tsRequest"))
            .file("tableau_workbook", "sales.twbx", b"PK\x03\x04".to_vec())
            .build();

        let boundary = content_type
            .strip_prefix("multipart/mixed; boundary=")
            .unwrap()
            .to_string();
        let text = String::from_utf8_lossy(&body);

        assert!(text.starts_with(&format!("--{boundary}\r\nContent-Disposition: name=\"request_payload\"\r\nContent-Type: application/xml\r\n\r\n<tsRequest/>\r\n")));
        assert!(text.contains("Content-Disposition: name=\"tableau_workbook\"; filename=\"sales.twbx\"\r\nContent-Type: application/octet-stream\r\n\r\n"));
        assert!(text.ends_with(&format!("\r\n--{boundary}--\r\n")));
        assert_eq!(text.matches(&format!("--{boundary}\r\n")).count(), 2);
    }

    #[test]
    fn test_boundary_depends_on_content() {
        let a = Multipart::new().file("f", "a", b"one".to_vec()).build().1;
        let b = Multipart::new().file("f", "a", b"two".to_vec()).build().1;
        let a2 = Multipart::new().file("f", "a", b"one".to_vec()).build().1;
        assert_ne!(a, b);
        assert_eq!(a, a2);
    }
}
