// * Run configuration: compiled-in constants plus credentials from the environment

pub mod constants;

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use self::constants::*;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVariable(&'static str),
}

/// Login credentials for the acquisition run.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    // * Reads both credential variables from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    // * Resolves credentials through an arbitrary lookup; empty values count as missing
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingVariable(key))
        };

        Ok(Self {
            email: read(ENV_EMAIL)?,
            password: read(ENV_PASSWORD)?,
        })
    }
}

/// Settings for the testimonial scraper.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub listing_url: String,
    pub output_path: PathBuf,
    pub entry_limit: usize,
    pub slides_per_person: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            listing_url: TESTIMONIAL_LISTING_URL.to_string(),
            output_path: PathBuf::from(TESTIMONIAL_OUTPUT_PATH),
            entry_limit: TESTIMONIAL_ENTRY_LIMIT,
            slides_per_person: SLIDES_PER_PERSON,
        }
    }
}

/// Scroll expansion thresholds.
#[derive(Debug, Clone)]
pub struct ExpansionConfig {
    pub max_iterations: usize,
    pub plateau_limit: usize,
    pub target_count: usize,
    pub pause: Duration,
    pub extra_offsets: Vec<i64>,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            max_iterations: EXPANSION_MAX_ITERATIONS,
            plateau_limit: EXPANSION_PLATEAU_LIMIT,
            target_count: EXPANSION_TARGET_COUNT,
            pause: Duration::from_millis(EXPANSION_PAUSE_MS),
            extra_offsets: EXPANSION_EXTRA_OFFSETS.to_vec(),
        }
    }
}

/// File naming used when persisting gallery images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingScheme {
    // * slide_1.jpg ..= slide_N.jpg
    Slots,
    // * YYYYmmdd_HHMMSS_<digest8>.jpg
    Timestamped,
}

/// Settings for the photo acquisition pipeline.
#[derive(Debug, Clone)]
pub struct GalleryConfig {
    pub login_url: String,
    pub gallery_urls: Vec<String>,
    pub output_dir: PathBuf,
    pub max_retained: usize,
    pub naming: NamingScheme,
    pub min_viable_thumbnails: usize,
    pub expansion: ExpansionConfig,
    pub sample_stride: usize,
    pub sample_limit: usize,
    pub login_settle: Duration,
    pub page_settle: Duration,
    pub modal_open: Duration,
    pub locator_timeout: Duration,
    pub locator_poll: Duration,
    pub image_load_timeout: Duration,
    pub overlay_close: Duration,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            login_url: LOGIN_URL.to_string(),
            gallery_urls: GALLERY_CANDIDATE_URLS.iter().map(|u| u.to_string()).collect(),
            output_dir: PathBuf::from(IMAGE_OUTPUT_DIR),
            max_retained: MAX_RETAINED_IMAGES,
            naming: NamingScheme::Slots,
            min_viable_thumbnails: MIN_VIABLE_THUMBNAILS,
            expansion: ExpansionConfig::default(),
            sample_stride: SAMPLE_STRIDE,
            sample_limit: SAMPLE_LIMIT,
            login_settle: Duration::from_millis(LOGIN_SETTLE_MS),
            page_settle: Duration::from_millis(PAGE_SETTLE_MS),
            modal_open: Duration::from_millis(MODAL_OPEN_MS),
            locator_timeout: Duration::from_millis(LOCATOR_TIMEOUT_MS),
            locator_poll: Duration::from_millis(LOCATOR_POLL_MS),
            image_load_timeout: Duration::from_millis(IMAGE_LOAD_TIMEOUT_MS),
            overlay_close: Duration::from_millis(OVERLAY_CLOSE_MS),
        }
    }
}

impl GalleryConfig {
    // * Zeroes every wait; used by tests driving scripted fakes
    pub fn without_delays(mut self) -> Self {
        self.login_settle = Duration::ZERO;
        self.page_settle = Duration::ZERO;
        self.modal_open = Duration::ZERO;
        self.locator_timeout = Duration::from_millis(50);
        self.locator_poll = Duration::from_millis(5);
        self.image_load_timeout = Duration::from_millis(20);
        self.overlay_close = Duration::ZERO;
        self.expansion.pause = Duration::ZERO;
        self
    }
}
