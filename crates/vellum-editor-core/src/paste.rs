//! Cleanup for markup pasted from word processors.
//!
//! Pasted HTML arrives full of vendor cruft: namespaced `o:` elements,
//! `mso-heading` styles standing in for real headings, empty spans, and
//! hard-coded fonts and colors. This pass strips all of it before the
//! fragment ever reaches sanitization.

use vellum_dom::{DomTree, NodeId};

/// Style properties scrubbed from pasted elements so the editor's own
/// styling wins.
const SCRUBBED_PROPS: &[&str] = &[
    "margin",
    "padding",
    "border",
    "background",
    "font-family",
    "font-size",
    "color",
    "line-height",
];

/// Clean a pasted markup fragment.
pub fn clean_word_markup(markup: &str) -> String {
    let mut tree = DomTree::from_markup(markup);

    // Vendor-namespaced elements go entirely, subtree included.
    loop {
        let vendor = tree.find_first(|t, id| t.tag(id).is_some_and(|tag| tag.starts_with("o:")));
        match vendor {
            Some(id) => tree.detach(id),
            None => break,
        }
    }

    // mso-heading levels become real headings.
    let styled: Vec<NodeId> = tree.find_all(|t, id| t.style(id).get("mso-heading").is_some());
    for id in styled {
        let level = tree
            .style(id)
            .get("mso-heading")
            .and_then(|v| v.chars().find(|c| c.is_ascii_digit()))
            .and_then(|c| c.to_digit(10));
        let tag = match level {
            Some(n @ 1..=6) => format!("h{n}"),
            _ => "p".to_string(),
        };
        if let Some(el) = tree.element_mut(id) {
            el.tag = tag.into();
        }
        let mut style = tree.style(id);
        style.remove("mso-heading");
        tree.set_style(id, &style);
    }

    // Attribute-less spans carry nothing; splice their children up.
    loop {
        let empty_span = tree.find_first(|t, id| {
            t.element(id)
                .is_some_and(|el| el.tag == "span" && el.attrs().is_empty())
        });
        match empty_span {
            Some(id) => {
                tree.unwrap_node(id);
            }
            None => break,
        }
    }

    // Scrub presentational overrides everywhere.
    let elements: Vec<NodeId> = tree.find_all(|t, id| t.element(id).is_some());
    for id in elements {
        let mut style = tree.style(id);
        for prop in SCRUBBED_PROPS {
            style.remove(prop);
        }
        tree.set_style(id, &style);
        if let Some(el) = tree.element_mut(id) {
            if el.attr("class") == Some("") {
                el.remove_attr("class");
            }
        }
    }

    tree.to_html()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_elements_removed() {
        let out = clean_word_markup("<p>keep<o:p>drop</o:p></p>");
        assert_eq!(out, "<p>keep</p>");
    }

    #[test]
    fn test_mso_heading_becomes_real_heading() {
        let out = clean_word_markup(r#"<div style="mso-heading: 2;">Title</div>"#);
        assert_eq!(out, "<h2>Title</h2>");
        let out = clean_word_markup(r#"<div style="mso-heading: 9;">Deep</div>"#);
        assert_eq!(out, "<p>Deep</p>");
    }

    #[test]
    fn test_bare_spans_unwrapped() {
        let out = clean_word_markup("<p><span><span>x</span></span> <span class=\"k\">y</span></p>");
        assert_eq!(out, "<p>x <span class=\"k\">y</span></p>");
    }

    #[test]
    fn test_presentational_styles_scrubbed() {
        let out = clean_word_markup(
            r#"<p style="font-family: Calibri; color: navy; text-align: right;">x</p>"#,
        );
        assert_eq!(out, r#"<p style="text-align: right;">x</p>"#);
    }
}
