//! Debug rendering of the connected surface as markup.

use crate::{Surface, SurfaceData, SurfaceId};

impl Surface {
    /// Render the whole connected tree, root included.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(self.root(), &mut out);
        out
    }

    fn write_html(&self, node: SurfaceId, out: &mut String) {
        match self.data(node) {
            Ok(SurfaceData::Element { tag, attributes }) => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape(value, true));
                    out.push('"');
                }
                out.push('>');
                let children = self.children(node);
                if children.is_empty() && is_void(tag) {
                    return;
                }
                for child in children {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            Ok(SurfaceData::Text { text }) => out.push_str(&escape(text, false)),
            Err(_) => {}
        }
    }
}

/// Elements written without a closing tag when empty.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str())
}

fn escape(value: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_html_escapes_text_and_attributes() {
        let mut surface = Surface::new("div");
        let p = surface.create_element("p");
        surface.set_attribute(p, "title", "a \"b\"").unwrap();
        let text = surface.create_text("1 < 2 & 3");
        surface.append_child(p, text).unwrap();
        surface.append_child(surface.root(), p).unwrap();

        assert_eq!(
            surface.to_html(),
            "<div><p title=\"a &quot;b&quot;\">1 &lt; 2 &amp; 3</p></div>"
        );
    }

    #[test]
    fn test_void_elements_have_no_closing_tag() {
        let mut surface = Surface::new("div");
        let p = surface.create_element("p");
        let br = surface.create_element("br");
        let text = surface.create_text("line");
        surface.append_child(p, text).unwrap();
        surface.append_child(p, br).unwrap();
        surface.append_child(surface.root(), p).unwrap();
        let hr = surface.create_element("hr");
        surface.append_child(surface.root(), hr).unwrap();

        assert_eq!(surface.to_html(), "<div><p>line<br></p><hr></div>");
    }
}
