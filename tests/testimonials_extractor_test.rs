use eroom_harvest::config::ExtractorConfig;
use eroom_harvest::network::{NetworkError, PageSource};
use eroom_harvest::testimonials::{ExtractError, TestimonialDocument, TestimonialExtractor};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Mutex;

// * Test Suite for the testimonial scraper, served from in-memory pages

const LISTING: &str = "https://e-roomjp.com/experiences/";

struct FixtureSource {
    pages: HashMap<String, String>,
    blobs: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl FixtureSource {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
            blobs: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn page(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), html);
        self
    }

    fn blob(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.blobs.insert(url.to_string(), bytes);
        self
    }
}

impl PageSource for FixtureSource {
    async fn fetch_text(&self, url: &str) -> Result<String, NetworkError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned().ok_or(NetworkError::Status {
            status: 404,
            url: url.to_string(),
        })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.blobs.get(url).cloned().ok_or(NetworkError::Status {
            status: 404,
            url: url.to_string(),
        })
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 251) as u8, (y % 241) as u8, ((x * y) % 239) as u8])
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn listing_html(entries: usize) -> String {
    let posts: String = (0..entries)
        .map(|i| {
            format!(
                r#"<article class="post"><a href="/experiences/p{i}/"><img src="/uploads/list-{i}.jpg"></a></article>"#
            )
        })
        .collect();
    format!(r#"<html><body><div id="content">{posts}</div></body></html>"#)
}

fn detail_html(i: usize, advice: &str) -> String {
    format!(
        r#"<html><body>
          <div class="pageTitle"><h1>
            花子{i}（女性）年齢：2{i}歳 留学期間：{i}ヶ月
          </h1></div>
          <article>
            <img src="/uploads/p{i}-a-150x150.png">
            <img src="/uploads/p{i}-b.png">
            <img src="/uploads/p{i}-c-300x200.png">
            <img src="/uploads/p{i}-gone.png">
            <h2><span>卒業生からのアドバイス</span></h2>
            <p>{advice}</p>
          </article>
        </body></html>"#
    )
}

fn site(entries: usize, long_advice_for_first: bool) -> FixtureSource {
    let mut source = FixtureSource::new().page(LISTING, listing_html(entries));
    for i in 0..entries {
        let advice = if i == 0 && long_advice_for_first {
            "話".repeat(150)
        } else {
            format!("毎日英語を話しましょう{i}")
        };
        source = source
            .page(&format!("https://e-roomjp.com/experiences/p{i}/"), detail_html(i, &advice))
            .blob(&format!("https://e-roomjp.com/uploads/p{i}-a.png"), png(40, 30))
            .blob(&format!("https://e-roomjp.com/uploads/p{i}-b.png"), png(120, 80))
            .blob(&format!("https://e-roomjp.com/uploads/p{i}-c.png"), png(200, 100));
    }
    source
}

fn config(output: &Path) -> ExtractorConfig {
    ExtractorConfig {
        listing_url: LISTING.to_string(),
        output_path: output.to_path_buf(),
        ..ExtractorConfig::default()
    }
}

#[tokio::test]
async fn test_extracts_exactly_four_records() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("contents").join("person.json");
    let extractor = TestimonialExtractor::new(site(6, true), config(&output));

    let written = extractor.run().await.unwrap();
    assert_eq!(written.as_deref(), Some(output.as_path()));

    let doc: TestimonialDocument =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(doc.persons.len(), 4);

    for (i, person) in doc.persons.iter().enumerate() {
        assert_eq!(person.name, format!("花子{i}"));
        assert_eq!(person.gender, "女性");
        assert_eq!(person.age, format!("2{i}歳"));
        assert_eq!(person.period, format!("{i}ヶ月"));
        assert_eq!(person.url, format!("https://e-roomjp.com/experiences/p{i}/"));
        // * Smallest width wins the main slot
        assert_eq!(person.img, format!("https://e-roomjp.com/uploads/p{i}-a.png"));
    }

    assert_eq!(doc.persons[0].advice.chars().count(), 103);
    assert!(doc.persons[0].advice.ends_with("..."));
    assert_eq!(doc.persons[1].advice, "毎日英語を話しましょう1");
}

#[tokio::test]
async fn test_slideshow_picks_two_widest_per_person() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("person.json");
    let extractor = TestimonialExtractor::new(site(4, false), config(&output));

    let doc = extractor.extract().await.unwrap().unwrap();
    assert_eq!(doc.slide_img.len(), 8);
    assert_eq!(doc.slide_img[0], "https://e-roomjp.com/uploads/p0-c.png");
    assert_eq!(doc.slide_img[1], "https://e-roomjp.com/uploads/p0-b.png");
    assert_eq!(doc.slide_img[6], "https://e-roomjp.com/uploads/p3-c.png");
}

#[tokio::test]
async fn test_missing_container_is_silent_noop() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("person.json");
    let source = FixtureSource::new().page(LISTING, "<html><body><p>maintenance</p></body></html>".into());
    let extractor = TestimonialExtractor::new(source, config(&output));

    assert!(extractor.run().await.unwrap().is_none());
    assert!(!output.exists());
}

#[tokio::test]
async fn test_malformed_title_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("person.json");
    let source = FixtureSource::new()
        .page(LISTING, listing_html(1))
        .page(
            "https://e-roomjp.com/experiences/p0/",
            r#"<div class="pageTitle"><h1>No delimiters here</h1></div><article></article>"#.into(),
        );
    let extractor = TestimonialExtractor::new(source, config(&output));

    let err = extractor.run().await.unwrap_err();
    assert!(matches!(err, ExtractError::Title(_)));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_listing_thumbnail_used_when_no_image_measures() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("person.json");
    let source = FixtureSource::new().page(LISTING, listing_html(1)).page(
        "https://e-roomjp.com/experiences/p0/",
        detail_html(0, "short"),
    );
    let extractor = TestimonialExtractor::new(source, config(&output));

    let doc = extractor.extract().await.unwrap().unwrap();
    assert_eq!(doc.persons.len(), 1);
    assert_eq!(doc.persons[0].img, "https://e-roomjp.com/uploads/list-0.jpg");
    assert!(doc.slide_img.is_empty());
}
