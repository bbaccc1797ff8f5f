//! Small DOM helpers shared by the lookups.

use scraper::{ElementRef, Node};

/// Concatenated, trimmed text content of an element.
pub fn text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Attribute value of an element, if present.
pub fn attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name)
}

/// Text content with `<br>` elements rendered as line breaks.
pub fn text_with_breaks(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) if e.name() == "br" => out.push('\n'),
            _ => {}
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn test_text_with_breaks() {
        let html = Html::parse_fragment("<p class=\"panel\">Hello<br>second <b>line</b><br/>end</p>");
        let sel = Selector::parse("p").unwrap();
        let p = html.select(&sel).next().unwrap();
        assert_eq!(text_with_breaks(p), "Hello\nsecond line\nend");
        assert_eq!(text(p), "Hellosecond lineend");
    }
}
