//! Markdown rendering for backend-served documentation (help and legal
//! pages). One interface, one library; headings, emphasis, links and both
//! list kinds are the surface the docs actually use.

use pulldown_cmark::{Options, Parser, html};

/// Render a markdown document to an HTML fragment.
pub fn to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::empty());
    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_and_emphasis() {
        let html = to_html("# Guide\n\nDu texte **fort** et *souligne*.");
        assert!(html.contains("<h1>Guide</h1>"));
        assert!(html.contains("<strong>fort</strong>"));
        assert!(html.contains("<em>souligne</em>"));
    }

    #[test]
    fn test_links() {
        let html = to_html("[aide](https://example.test/aide)");
        assert!(html.contains(r#"<a href="https://example.test/aide">aide</a>"#));
    }

    #[test]
    fn test_unordered_and_ordered_lists_close_properly() {
        let html = to_html("- un\n- deux\n\n1. premier\n2. second\n");
        assert!(html.contains("<ul>"));
        assert!(html.contains("</ul>"));
        assert!(html.contains("<ol>"));
        assert!(html.contains("</ol>"));
        assert_eq!(html.matches("<li>").count(), 4);
        assert_eq!(html.matches("</li>").count(), 4);
    }
}
