//! Blog body rendering.

use comrak::{Options, markdown_to_html};

/// Render a post body written in GitHub Flavored Markdown.
///
/// Raw HTML in the source is escaped: post bodies are operator-written but
/// stored in a database the storefront does not fully control.
#[must_use]
pub fn render(source: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.header_ids = Some(String::new());
    options.extension.footnotes = true;

    markdown_to_html(source, &options)
}
