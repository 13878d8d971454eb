// * Testimonial Scraper
// * Listing page -> detail pages -> person records + slideshow picks -> one JSON document.

pub mod advice;
pub mod extractor;
pub mod images;
pub mod title;

pub use extractor::TestimonialExtractor;
pub use images::ImageCandidate;
pub use title::{parse_title, TitleFields, TitleParseError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::network::NetworkError;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Fetch failed: {0}")]
    Network(#[from] NetworkError),

    #[error("Title parsing failed: {0}")]
    Title(#[from] TitleParseError),

    #[error("Expected element {selector:?} missing on {url}")]
    MissingElement { selector: &'static str, url: String },

    #[error("Invalid URL {0:?}")]
    InvalidUrl(String),

    #[error("Output write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// One graduate's testimonial as published on the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestimonialRecord {
    pub name: String,
    pub gender: String,
    pub age: String,
    pub period: String,
    pub img: String,
    pub url: String,
    pub advice: String,
}

/// The document written to the output path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestimonialDocument {
    pub persons: Vec<TestimonialRecord>,
    #[serde(rename = "slideImg")]
    pub slide_img: Vec<String>,
}
