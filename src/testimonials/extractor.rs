use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use url::Url;

use super::advice::{find_advice, truncate_advice};
use super::images::{collect_article_images, select_main, select_slides, ImageCandidate};
use super::title::parse_title;
use super::{ExtractError, TestimonialDocument, TestimonialRecord};
use crate::config::ExtractorConfig;
use crate::network::PageSource;

static SELECTOR_CONTENT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#content").unwrap());
static SELECTOR_POST: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article.post").unwrap());
static SELECTOR_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").unwrap());
static SELECTOR_IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());
static SELECTOR_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".pageTitle h1").unwrap());

// * One article teaser on the listing page
#[derive(Debug, Clone, PartialEq)]
struct ListingEntry {
    detail_url: String,
    thumbnail: Option<String>,
}

// * Owned view of a detail page, taken before any further awaits
#[derive(Debug)]
struct DetailPage {
    title: String,
    advice: Option<String>,
    image_urls: Vec<String>,
}

/// Scrapes the experience listing into a [`TestimonialDocument`].
pub struct TestimonialExtractor<S> {
    source: S,
    config: ExtractorConfig,
}

impl<S: PageSource> TestimonialExtractor<S> {
    pub fn new(source: S, config: ExtractorConfig) -> Self {
        Self { source, config }
    }

    /// Extracts and writes the document. `Ok(None)` means the listing had no
    /// content container and nothing was written.
    pub async fn run(&self) -> Result<Option<PathBuf>, ExtractError> {
        let Some(document) = self.extract().await? else {
            return Ok(None);
        };

        write_document(&self.config.output_path, &document)?;
        info!(
            path = %self.config.output_path.display(),
            persons = document.persons.len(),
            slides = document.slide_img.len(),
            "Testimonials written"
        );
        Ok(Some(self.config.output_path.clone()))
    }

    pub async fn extract(&self) -> Result<Option<TestimonialDocument>, ExtractError> {
        let listing_url = Url::parse(&self.config.listing_url)
            .map_err(|_| ExtractError::InvalidUrl(self.config.listing_url.clone()))?;

        let html = self.source.fetch_text(listing_url.as_str()).await?;
        let Some(entries) = parse_listing(&html, &listing_url) else {
            warn!(url = %listing_url, "Listing has no #content container; nothing to extract");
            return Ok(None);
        };

        if entries.len() < self.config.entry_limit {
            warn!(
                found = entries.len(),
                wanted = self.config.entry_limit,
                "Listing holds fewer entries than requested"
            );
        }

        let mut document = TestimonialDocument::default();
        for entry in entries.iter().take(self.config.entry_limit) {
            let (record, slides) = self.extract_person(entry).await?;
            document.slide_img.extend(slides);
            document.persons.push(record);
        }

        Ok(Some(document))
    }

    async fn extract_person(
        &self,
        entry: &ListingEntry,
    ) -> Result<(TestimonialRecord, Vec<String>), ExtractError> {
        let page_url = Url::parse(&entry.detail_url)
            .map_err(|_| ExtractError::InvalidUrl(entry.detail_url.clone()))?;
        let html = self.source.fetch_text(page_url.as_str()).await?;
        let page = parse_detail(&html, &page_url)?;

        let fields = parse_title(&page.title)?;
        let advice = match page.advice {
            Some(text) => truncate_advice(&text),
            None => {
                warn!(url = %page_url, "Advice paragraph not found");
                String::new()
            }
        };

        let candidates = self.measure_candidates(&page.image_urls).await;
        let img = select_main(&candidates)
            .map(|c| c.url.clone())
            .or_else(|| entry.thumbnail.clone())
            .unwrap_or_default();
        let slides: Vec<String> = select_slides(&candidates, self.config.slides_per_person)
            .into_iter()
            .map(|c| c.url.clone())
            .collect();

        debug!(
            name = %fields.name,
            candidates = candidates.len(),
            slides = slides.len(),
            "Person extracted"
        );

        let record = TestimonialRecord {
            name: fields.name,
            gender: fields.gender,
            age: fields.age,
            period: fields.period,
            img,
            url: entry.detail_url.clone(),
            advice,
        };

        Ok((record, slides))
    }

    // * Fetches every candidate to learn its true size; unusable ones are dropped
    async fn measure_candidates(&self, urls: &[String]) -> Vec<ImageCandidate> {
        let mut measured = Vec::with_capacity(urls.len());

        for url in urls {
            match self.source.fetch_bytes(url).await {
                Ok(bytes) => match ImageCandidate::measure(url, &bytes) {
                    Some(candidate) => measured.push(candidate),
                    None => warn!(url = %url, "Image could not be decoded; skipped"),
                },
                Err(e) => warn!(url = %url, error = %e, "Image fetch failed; skipped"),
            }
        }

        measured
    }
}

// * None when the content container is absent
fn parse_listing(html: &str, base: &Url) -> Option<Vec<ListingEntry>> {
    let document = Html::parse_document(html);
    let content = document.select(&SELECTOR_CONTENT).next()?;

    let entries = content
        .select(&SELECTOR_POST)
        .filter_map(|post| {
            let href = post.select(&SELECTOR_LINK).next()?.value().attr("href")?;
            let Ok(detail) = base.join(href) else {
                warn!(href, "Unresolvable entry link; skipped");
                return None;
            };
            let thumbnail = post
                .select(&SELECTOR_IMG)
                .next()
                .and_then(|img| img.value().attr("src"))
                .and_then(|src| base.join(src).ok())
                .map(|u| u.to_string());

            Some(ListingEntry {
                detail_url: detail.to_string(),
                thumbnail,
            })
        })
        .collect();

    Some(entries)
}

fn parse_detail(html: &str, page_url: &Url) -> Result<DetailPage, ExtractError> {
    let document = Html::parse_document(html);

    let title = document
        .select(&SELECTOR_TITLE)
        .next()
        .map(|h1| h1.text().collect::<String>().trim().to_string())
        .ok_or_else(|| ExtractError::MissingElement {
            selector: ".pageTitle h1",
            url: page_url.to_string(),
        })?;

    Ok(DetailPage {
        title,
        advice: find_advice(&document),
        image_urls: collect_article_images(&document, page_url),
    })
}

/// Writes the document as pretty UTF-8 JSON, creating parent directories.
pub fn write_document(path: &Path, document: &TestimonialDocument) -> Result<(), ExtractError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(document)?;
    std::fs::write(path, json)?;
    Ok(())
}
