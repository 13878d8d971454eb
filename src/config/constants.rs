// * Configuration Constants
// * Central location for every target URL, output path, threshold and timeout

// --- Testimonial Scraper ---

// * Listing page holding the graduate experience articles
pub const TESTIMONIAL_LISTING_URL: &str = "https://e-roomjp.com/experiences/";

// * Where the extracted testimonials are written
pub const TESTIMONIAL_OUTPUT_PATH: &str = "contents/person.json";

// * Number of listing entries followed per run
pub const TESTIMONIAL_ENTRY_LIMIT: usize = 4;

// * Marker phrase on the span that precedes the advice paragraph
pub const ADVICE_MARKER: &str = "卒業生からのアドバイス";

// * Advice text is cut to this many characters before the ellipsis
pub const ADVICE_MAX_CHARS: usize = 100;

pub const ADVICE_ELLIPSIS: &str = "...";

// * Slideshow picks taken from each person's article
pub const SLIDES_PER_PERSON: usize = 2;

// --- Network ---

// * HTTP request timeout in seconds
pub const HTTP_TIMEOUT_SECS: u64 = 30;

// --- Photo Acquisition ---

// * Credential environment variables
pub const ENV_EMAIL: &str = "FACEBOOK_EMAIL";
pub const ENV_PASSWORD: &str = "FACEBOOK_PASSWORD";

pub const LOGIN_URL: &str = "https://www.facebook.com/login";

// * Gallery pages tried in order; the first with enough thumbnails wins
pub const GALLERY_CANDIDATE_URLS: &[&str] = &[
    "https://www.facebook.com/profile.php?id=100054664260008&sk=photos_by",
    "https://www.facebook.com/profile.php?id=100054664260008&sk=photos",
    "https://www.facebook.com/profile.php?id=100054664260008&sk=photos_albums",
];

pub const IMAGE_OUTPUT_DIR: &str = "images/facebook";

// * Retained-count ceiling for the image directory
pub const MAX_RETAINED_IMAGES: usize = 5;

// * Wait after submitting the login form
pub const LOGIN_SETTLE_MS: u64 = 5_000;

// * Wait after each gallery navigation
pub const PAGE_SETTLE_MS: u64 = 3_000;

// * Page navigation timeout in milliseconds
pub const PAGE_TIMEOUT_MS: u64 = 60_000;

// * Minimum thumbnail count for a selector strategy or gallery URL to be viable
pub const MIN_VIABLE_THUMBNAILS: usize = 3;

// * Scroll expansion loop
pub const EXPANSION_MAX_ITERATIONS: usize = 15;
pub const EXPANSION_PLATEAU_LIMIT: usize = 3;
pub const EXPANSION_TARGET_COUNT: usize = 30;
pub const EXPANSION_PAUSE_MS: u64 = 2_000;
pub const EXPANSION_EXTRA_OFFSETS: &[i64] = &[800, 1_600];

// * Stride sampling over the discovered thumbnails
pub const SAMPLE_STRIDE: usize = 3;
pub const SAMPLE_LIMIT: usize = 12;

// * Pause after clicking a thumbnail before looking for the modal image
pub const MODAL_OPEN_MS: u64 = 1_500;

// * Per-strategy polling budget for the full resolution image
pub const LOCATOR_TIMEOUT_MS: u64 = 4_000;
pub const LOCATOR_POLL_MS: u64 = 250;

// * Best-effort wait for the image load-complete signal
pub const IMAGE_LOAD_TIMEOUT_MS: u64 = 5_000;

// * Pause after closing the overlay
pub const OVERLAY_CLOSE_MS: u64 = 800;
