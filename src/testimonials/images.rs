// * Image candidate discovery, measurement and ranking for experience articles.

use regex::Regex;
use scraper::{Html, Selector};
use std::cmp::Ordering;
use std::io::Cursor;
use std::sync::LazyLock;
use url::Url;

static SELECTOR_ARTICLE_IMG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article img").unwrap());

// * WordPress thumbnail variants: `photo-300x200.jpg` -> `photo.jpg`
static THUMBNAIL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\d+x\d+(\.[A-Za-z0-9]+)$").unwrap());

// * Attributes checked in order; lazy-loading plugins park the real URL in data-*
const SOURCE_ATTRIBUTES: &[&str] = &["src", "data-src", "data-lazy-src"];

/// A fetched image with its true dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCandidate {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub byte_size: usize,
}

impl ImageCandidate {
    // * Bytes per pixel; higher means more detail per pixel
    pub fn density(&self) -> f64 {
        let area = self.width as f64 * self.height as f64;
        if area == 0.0 {
            return 0.0;
        }
        self.byte_size as f64 / area
    }

    /// Measures the payload's dimensions. Returns `None` when the bytes are not a decodable image.
    pub fn measure(url: &str, bytes: &[u8]) -> Option<Self> {
        let (width, height) = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .ok()?
            .into_dimensions()
            .ok()?;

        Some(Self {
            url: url.to_string(),
            width,
            height,
            byte_size: bytes.len(),
        })
    }
}

/// Maps a resized thumbnail URL to its original upload.
pub fn original_variant(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            let stripped = THUMBNAIL_SUFFIX.replace(parsed.path(), "$1").into_owned();
            parsed.set_path(&stripped);
            parsed.to_string()
        }
        Err(_) => THUMBNAIL_SUFFIX.replace(url, "$1").into_owned(),
    }
}

/// Collects the original-variant URL of every image in the page's article body, in
/// document order and without repeats.
pub fn collect_article_images(document: &Html, page_url: &Url) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();

    for img in document.select(&SELECTOR_ARTICLE_IMG) {
        let Some(raw) = SOURCE_ATTRIBUTES
            .iter()
            .filter_map(|attr| img.value().attr(attr))
            .map(str::trim)
            .find(|v| !v.is_empty() && !v.starts_with("data:"))
        else {
            continue;
        };

        let Ok(resolved) = page_url.join(raw) else {
            continue;
        };

        let original = original_variant(resolved.as_str());
        if !urls.contains(&original) {
            urls.push(original);
        }
    }

    urls
}

/// The smallest-width candidate; the first one wins ties.
pub fn select_main(candidates: &[ImageCandidate]) -> Option<&ImageCandidate> {
    candidates
        .iter()
        .enumerate()
        .min_by_key(|(idx, c)| (c.width, *idx))
        .map(|(_, c)| c)
}

/// Orders by width descending, then density descending.
pub fn rank_for_slideshow(a: &ImageCandidate, b: &ImageCandidate) -> Ordering {
    b.width
        .cmp(&a.width)
        .then_with(|| b.density().partial_cmp(&a.density()).unwrap_or(Ordering::Equal))
}

/// The top `count` candidates under [`rank_for_slideshow`].
pub fn select_slides(candidates: &[ImageCandidate], count: usize) -> Vec<&ImageCandidate> {
    let mut ranked: Vec<&ImageCandidate> = candidates.iter().collect();
    // * Stable sort keeps document order among exact ties
    ranked.sort_by(|a, b| rank_for_slideshow(a, b));
    ranked.truncate(count);
    ranked
}
