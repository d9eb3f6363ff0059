//! Fallback Markdown/HTML exports rendered from an element stream.
//!
//! Used when a parser has no native export (plain text, element dumps that
//! omit `markdown`/`html`).

use madforge_shared::{ParsedElement, ParsedItem};

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn readable(items: &[ParsedItem]) -> impl Iterator<Item = &ParsedElement> {
    items.iter().filter_map(|item| match item {
        ParsedItem::Element(el) if !el.text.trim().is_empty() => Some(el),
        _ => None,
    })
}

fn label_of(el: &ParsedElement) -> &str {
    el.label.as_deref().unwrap_or("text")
}

/// Render elements as Markdown blocks separated by blank lines.
pub fn render_markdown(items: &[ParsedItem]) -> String {
    let blocks: Vec<String> = readable(items)
        .map(|el| {
            let text = el.text.trim();
            match label_of(el) {
                "title" => format!("# {text}"),
                "section-header" | "page-header" => format!("## {text}"),
                "list-item" => format!("- {text}"),
                "code" => format!("```\n{text}\n```"),
                "figure" => format!("*Figure: {text}*"),
                _ => text.to_string(),
            }
        })
        .collect();

    if blocks.is_empty() {
        String::new()
    } else {
        format!("{}\n", blocks.join("\n\n"))
    }
}

/// Render elements as a minimal HTML fragment.
pub fn render_html(items: &[ParsedItem]) -> String {
    let mut html = String::new();
    for el in readable(items) {
        let text = escape_html(el.text.trim());
        let line = match label_of(el) {
            "title" => format!("<h1>{text}</h1>"),
            "section-header" | "page-header" => format!("<h2>{text}</h2>"),
            "list-item" => format!("<li>{text}</li>"),
            "code" => format!("<pre><code>{text}</code></pre>"),
            "table" => format!("<pre class=\"table\">{text}</pre>"),
            "figure" => format!("<figure><figcaption>{text}</figcaption></figure>"),
            _ => format!("<p>{text}</p>"),
        };
        html.push_str(&line);
        html.push('\n');
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<ParsedItem> {
        vec![
            ParsedItem::Element(ParsedElement::new("Intro", "title", 0)),
            ParsedItem::Element(ParsedElement::new("a < b & c", "paragraph", 0)),
            ParsedItem::Element(ParsedElement::new("   ", "paragraph", 0)),
            ParsedItem::Malformed {
                index: 3,
                reason: "bad".into(),
            },
        ]
    }

    #[test]
    fn markdown_skips_blank_and_malformed() {
        assert_eq!(render_markdown(&items()), "# Intro\n\na < b & c\n");
    }

    #[test]
    fn html_escapes_text() {
        let html = render_html(&items());
        assert!(html.contains("<h1>Intro</h1>"));
        assert!(html.contains("<p>a &lt; b &amp; c</p>"));
        assert_eq!(html.lines().count(), 2);
    }

    #[test]
    fn empty_stream_renders_nothing() {
        assert_eq!(render_markdown(&[]), "");
        assert_eq!(render_html(&[]), "");
    }
}
