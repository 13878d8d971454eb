// * Fallback cascades for finding thumbnails on the gallery page and the
// * full resolution image inside an opened photo view.

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

use super::driver::{js_string, PageDriver};

// * CDN size tokens such as `/s720x720/` or `_s960x960.`
static SIZE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[/_\-])s(\d{2,4})x(\d{2,4})($|[/_.\-])").unwrap());

const UPGRADED_EDGE: u32 = 2048;

/// A CSS query for thumbnail elements, optionally narrowed to elements wrapping an `<img>`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbnailStrategy {
    pub name: &'static str,
    pub css: &'static str,
    pub require_img: bool,
}

impl ThumbnailStrategy {
    pub fn selector(&self) -> String {
        if self.require_img {
            format!("{}:has(img)", self.css)
        } else {
            self.css.to_string()
        }
    }
}

// * Most specific first
pub const THUMBNAIL_STRATEGIES: &[ThumbnailStrategy] = &[
    ThumbnailStrategy {
        name: "photo_php_link",
        css: r#"a[href*="/photo.php"]"#,
        require_img: true,
    },
    ThumbnailStrategy {
        name: "photo_path_link",
        css: r#"a[href*="/photo/"]"#,
        require_img: true,
    },
    ThumbnailStrategy {
        name: "fbid_link",
        css: r#"a[href*="fbid="]"#,
        require_img: true,
    },
    ThumbnailStrategy {
        name: "main_role_link",
        css: r#"div[role="main"] a[role="link"]"#,
        require_img: true,
    },
    ThumbnailStrategy {
        name: "cdn_image",
        css: r#"img[src*="scontent"]"#,
        require_img: false,
    },
];

/// The strategy chosen for the current page and how many elements it matched.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailMatch {
    pub strategy: &'static str,
    pub selector: String,
    pub count: usize,
}

/// Queries every strategy and keeps the highest count among those reaching
/// `min_viable`. When none is viable the highest non-zero count is used.
pub async fn best_thumbnail_match<D: PageDriver>(
    driver: &D,
    strategies: &[ThumbnailStrategy],
    min_viable: usize,
) -> Option<ThumbnailMatch> {
    let mut best: Option<ThumbnailMatch> = None;
    let mut fallback: Option<ThumbnailMatch> = None;

    for strategy in strategies {
        let selector = strategy.selector();
        let count = match driver.count(&selector).await {
            Ok(count) => count,
            Err(e) => {
                debug!(strategy = strategy.name, error = %e, "Thumbnail query failed");
                0
            }
        };
        debug!(strategy = strategy.name, count, "Thumbnail strategy measured");
        if count == 0 {
            continue;
        }

        let found = ThumbnailMatch {
            strategy: strategy.name,
            selector,
            count,
        };
        let slot = if count >= min_viable { &mut best } else { &mut fallback };
        if slot.as_ref().map_or(true, |current| count > current.count) {
            *slot = Some(found);
        }
    }

    best.or(fallback)
}

/// One way of finding the full resolution image URL inside an opened photo view.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageLocator {
    // * `src` of the first element matching the selector
    Selector { name: &'static str, css: &'static str },
    // * Largest rendered image inside the dialog, by natural area
    LargestDialogImage,
    // * og:image of a standalone photo page, for clicks that navigate instead of opening a modal
    OpenGraph,
}

const LARGEST_DIALOG_IMAGE_JS: &str = r#"
(() => {
    const dialog = document.querySelector('div[role="dialog"]') || document;
    let best = null;
    let bestArea = 0;
    for (const img of dialog.querySelectorAll('img')) {
        const area = (img.naturalWidth || 0) * (img.naturalHeight || 0);
        if (img.src && img.src.startsWith('http') && area > bestArea) {
            best = img.src;
            bestArea = area;
        }
    }
    return best;
})()
"#;

impl ImageLocator {
    pub fn name(&self) -> &'static str {
        match self {
            ImageLocator::Selector { name, .. } => *name,
            ImageLocator::LargestDialogImage => "largest_dialog_image",
            ImageLocator::OpenGraph => "open_graph",
        }
    }

    /// Single lookup attempt. Driver errors count as "not found".
    pub async fn attempt<D: PageDriver>(&self, driver: &D) -> Option<String> {
        let found = match self {
            ImageLocator::Selector { css, .. } => driver.attribute(css, "src").await.ok().flatten(),
            ImageLocator::LargestDialogImage => driver
                .evaluate(LARGEST_DIALOG_IMAGE_JS)
                .await
                .ok()
                .and_then(|v| v.as_str().map(str::to_string)),
            ImageLocator::OpenGraph => driver
                .attribute(r#"meta[property="og:image"]"#, "content")
                .await
                .ok()
                .flatten(),
        };

        found.filter(|url| url.starts_with("http"))
    }

    /// Polls [`ImageLocator::attempt`] until it yields or `timeout` elapses.
    pub async fn locate<D: PageDriver>(
        &self,
        driver: &D,
        timeout: Duration,
        poll: Duration,
    ) -> Option<String> {
        let polling = async {
            loop {
                if let Some(url) = self.attempt(driver).await {
                    return url;
                }
                tokio::time::sleep(poll).await;
            }
        };

        tokio::time::timeout(timeout, polling).await.ok()
    }
}

pub fn default_image_locators() -> Vec<ImageLocator> {
    vec![
        ImageLocator::Selector {
            name: "media_vc_image",
            css: r#"img[data-visualcompletion="media-vc-image"]"#,
        },
        ImageLocator::Selector {
            name: "dialog_cdn_image",
            css: r#"div[role="dialog"] img[src*="scontent"]"#,
        },
        ImageLocator::Selector {
            name: "spotlight",
            css: "img.spotlight",
        },
        ImageLocator::LargestDialogImage,
        ImageLocator::OpenGraph,
    ]
}

/// Runs the locators in priority order, each with its own budget.
pub async fn locate_full_image<D: PageDriver>(
    driver: &D,
    locators: &[ImageLocator],
    timeout: Duration,
    poll: Duration,
) -> Option<(String, &'static str)> {
    for locator in locators {
        if let Some(url) = locator.locate(driver, timeout, poll).await {
            debug!(locator = locator.name(), url = %url, "Full image located");
            return Some((url, locator.name()));
        }
        debug!(locator = locator.name(), "Locator timed out");
    }
    None
}

/// Waits for the image's load-complete signal. Returns false on timeout; callers proceed anyway.
pub async fn wait_for_image_load<D: PageDriver>(
    driver: &D,
    url: &str,
    timeout: Duration,
    poll: Duration,
) -> bool {
    let script = format!(
        "(() => {{ const img = Array.from(document.images).find(i => i.src === {}); \
         return !!(img && img.complete && img.naturalWidth > 0); }})()",
        js_string(url)
    );

    let polling = async {
        loop {
            if let Ok(serde_json::Value::Bool(true)) = driver.evaluate(&script).await {
                return;
            }
            tokio::time::sleep(poll).await;
        }
    };

    tokio::time::timeout(timeout, polling).await.is_ok()
}

/// Rewrites CDN size tokens smaller than 2048 to request the large rendition.
pub fn upgrade_resolution(url: &str) -> String {
    SIZE_TOKEN
        .replace_all(url, |caps: &regex::Captures| {
            let width: u32 = caps[2].parse().unwrap_or(u32::MAX);
            let height: u32 = caps[3].parse().unwrap_or(u32::MAX);
            if width < UPGRADED_EDGE && height < UPGRADED_EDGE {
                format!("{}s{}x{}{}", &caps[1], UPGRADED_EDGE, UPGRADED_EDGE, &caps[4])
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}
