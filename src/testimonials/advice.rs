// * Locates and shortens the graduate advice paragraph on an experience page.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use crate::config::constants::{ADVICE_ELLIPSIS, ADVICE_MARKER, ADVICE_MAX_CHARS};

static SELECTOR_ARTICLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article").unwrap());

/// Returns the text of the first `<p>` that follows a `<span>` containing the marker phrase.
///
/// Pages without an `<article>` are not experience pages and yield `None`.
pub fn find_advice(document: &Html) -> Option<String> {
    document.select(&SELECTOR_ARTICLE).next()?;

    let mut after_marker = false;
    for node in document.root_element().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };

        match element.value().name() {
            "span" if !after_marker => {
                if element.text().collect::<String>().contains(ADVICE_MARKER) {
                    after_marker = true;
                }
            }
            "p" if after_marker => {
                return Some(element.text().collect::<String>().trim().to_string());
            }
            _ => {}
        }
    }

    None
}

/// Cuts text to the advice limit, appending the ellipsis only when something was cut.
pub fn truncate_advice(text: &str) -> String {
    match text.char_indices().nth(ADVICE_MAX_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ADVICE_ELLIPSIS),
        None => text.to_string(),
    }
}
