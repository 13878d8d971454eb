// * Photo acquisition run: authenticate, navigate, expand, sample, extract, persist.
// * One browser session per run, always released before returning.

use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::driver::{DriverError, DriverLauncher, PageDriver};
use super::expand::{expand, ExpansionOutcome};
use super::locator::{
    best_thumbnail_match, default_image_locators, locate_full_image, upgrade_resolution,
    wait_for_image_load, ImageLocator, ThumbnailStrategy, THUMBNAIL_STRATEGIES,
};
use super::sampling::sample_positions;
use super::store::{ImageStore, PersistOutcome, StoreError};
use super::AcquireError;
use crate::config::{Credentials, GalleryConfig};
use crate::network::{NetworkError, PageSource};

const EMAIL_FIELD: &str = "#email";
const PASSWORD_FIELD: &str = "#pass";
const LOGIN_BUTTON: &str = r#"[name="login"]"#;

const CLOSE_CONTROLS: &[&str] = &[
    r#"div[role="dialog"] [aria-label="Close"]"#,
    r#"[aria-label="Close"]"#,
    r#"[aria-label="閉じる"]"#,
];

const HISTORY_BACK_JS: &str = "history.back(); true";

// * Failures confined to one sampled position
#[derive(Debug, Error)]
enum ItemError {
    #[error("{0}")]
    Driver(#[from] DriverError),

    #[error("{0}")]
    Network(#[from] NetworkError),

    #[error("{0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, PartialEq)]
enum ItemOutcome {
    Saved(PathBuf),
    Duplicate,
    NoImage,
    NoOpenSlot,
}

/// Mutable bookkeeping threaded through the stages of one run.
#[derive(Debug, Default)]
pub struct RunState {
    pub target: usize,
    pub known_digests: HashSet<u64>,
    pub saved: Vec<PathBuf>,
    pub attempted: usize,
    pub duplicates: usize,
    pub missing: usize,
    pub failed: usize,
}

impl RunState {
    pub fn new(target: usize, known_digests: HashSet<u64>) -> Self {
        Self {
            target,
            known_digests,
            ..Self::default()
        }
    }

    pub fn target_met(&self) -> bool {
        self.saved.len() >= self.target
    }
}

/// What a finished run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub already_satisfied: bool,
    pub gallery_url: Option<String>,
    pub expansion: Option<ExpansionOutcome>,
    pub candidates: usize,
    pub sampled: usize,
    pub saved: Vec<PathBuf>,
    pub attempted: usize,
    pub duplicates: usize,
    pub missing: usize,
    pub failed: usize,
}

impl RunReport {
    fn already_satisfied() -> Self {
        Self {
            already_satisfied: true,
            ..Self::default()
        }
    }

    fn absorb(&mut self, state: RunState) {
        self.saved = state.saved;
        self.attempted = state.attempted;
        self.duplicates = state.duplicates;
        self.missing = state.missing;
        self.failed = state.failed;
    }
}

/// Drives one acquisition run against a launcher (browser) and a source (image downloads).
pub struct AcquisitionPipeline<L, S> {
    config: GalleryConfig,
    launcher: L,
    source: S,
    strategies: Vec<ThumbnailStrategy>,
    locators: Vec<ImageLocator>,
}

impl<L: DriverLauncher, S: PageSource> AcquisitionPipeline<L, S> {
    pub fn new(config: GalleryConfig, launcher: L, source: S) -> Self {
        Self {
            config,
            launcher,
            source,
            strategies: THUMBNAIL_STRATEGIES.to_vec(),
            locators: default_image_locators(),
        }
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Runs with credentials resolved through `lookup` (normally the process environment).
    pub async fn run<F>(&self, lookup: F) -> Result<RunReport, AcquireError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = Credentials::from_lookup(lookup)?;

        let store = ImageStore::open(&self.config.output_dir, self.config.max_retained, self.config.naming)?;
        if store.is_full()? {
            info!(
                dir = %store.dir().display(),
                max = store.max_retained(),
                "Image directory already full; nothing to do"
            );
            return Ok(RunReport::already_satisfied());
        }

        let mut state = RunState::new(store.remaining_capacity()?, store.digests()?);
        info!(target = state.target, known = state.known_digests.len(), "Acquisition starting");

        let driver = self.launcher.launch().await?;
        let mut report = RunReport::default();
        let outcome = self.drive(&driver, &credentials, &store, &mut state, &mut report).await;

        if let Err(e) = driver.close().await {
            warn!(error = %e, "Browser session did not close cleanly");
        }
        outcome?;

        report.absorb(state);
        info!(
            saved = report.saved.len(),
            attempted = report.attempted,
            duplicates = report.duplicates,
            missing = report.missing,
            failed = report.failed,
            "Acquisition finished"
        );
        Ok(report)
    }

    async fn drive(
        &self,
        driver: &L::Driver,
        credentials: &Credentials,
        store: &ImageStore,
        state: &mut RunState,
        report: &mut RunReport,
    ) -> Result<(), AcquireError> {
        self.authenticate(driver, credentials).await?;

        let gallery_url = self.navigate(driver).await?;
        report.gallery_url = Some(gallery_url);

        let expansion = expand(
            driver,
            &self.strategies,
            self.config.min_viable_thumbnails,
            &self.config.expansion,
        )
        .await;
        report.expansion = Some(expansion);

        let Some(thumbnails) =
            best_thumbnail_match(driver, &self.strategies, self.config.min_viable_thumbnails).await
        else {
            warn!("No thumbnail elements found on the gallery page");
            return Ok(());
        };
        info!(
            strategy = thumbnails.strategy,
            count = thumbnails.count,
            "Thumbnail candidates located"
        );

        let positions = sample_positions(
            thumbnails.count,
            self.config.sample_stride,
            self.config.sample_limit,
        );
        report.candidates = thumbnails.count;
        report.sampled = positions.len();
        debug!(?positions, "Sampled positions");

        for position in positions {
            if state.target_met() {
                break;
            }
            state.attempted += 1;

            match self.process_item(driver, &thumbnails.selector, position, store, state).await {
                Ok(ItemOutcome::Saved(path)) => {
                    info!(position, file = %path.display(), "Image acquired");
                    state.saved.push(path);
                }
                Ok(ItemOutcome::Duplicate) => {
                    info!(position, "Duplicate image skipped");
                    state.duplicates += 1;
                }
                Ok(ItemOutcome::NoImage) => {
                    warn!(position, "No full resolution image found");
                    state.missing += 1;
                }
                Ok(ItemOutcome::NoOpenSlot) => {
                    self.close_overlay(driver).await;
                    break;
                }
                Err(e) => {
                    warn!(position, error = %e, "Item failed");
                    state.failed += 1;
                }
            }

            self.close_overlay(driver).await;
        }

        Ok(())
    }

    async fn authenticate(&self, driver: &L::Driver, credentials: &Credentials) -> Result<(), DriverError> {
        driver.goto(&self.config.login_url).await?;
        driver.type_into(EMAIL_FIELD, &credentials.email).await?;
        driver.type_into(PASSWORD_FIELD, &credentials.password).await?;
        driver.click(LOGIN_BUTTON).await?;
        tokio::time::sleep(self.config.login_settle).await;
        info!("Login submitted");
        Ok(())
    }

    // * First candidate URL with a viable thumbnail count wins; otherwise the last one loaded
    async fn navigate(&self, driver: &L::Driver) -> Result<String, AcquireError> {
        let mut last_loaded: Option<String> = None;

        for url in &self.config.gallery_urls {
            if let Err(e) = driver.goto(url).await {
                warn!(url = %url, error = %e, "Gallery candidate failed to load");
                continue;
            }
            tokio::time::sleep(self.config.page_settle).await;

            let count = best_thumbnail_match(driver, &self.strategies, self.config.min_viable_thumbnails)
                .await
                .map_or(0, |m| m.count);
            info!(url = %url, count, "Gallery candidate measured");

            if count >= self.config.min_viable_thumbnails {
                return Ok(url.clone());
            }
            last_loaded = Some(url.clone());
        }

        match last_loaded {
            Some(url) => {
                warn!(url = %url, "No gallery candidate was viable; staying on the last one");
                Ok(url)
            }
            None => Err(AcquireError::NoGallery),
        }
    }

    async fn process_item(
        &self,
        driver: &L::Driver,
        selector: &str,
        position: usize,
        store: &ImageStore,
        state: &mut RunState,
    ) -> Result<ItemOutcome, ItemError> {
        driver.click_nth(selector, position).await?;
        tokio::time::sleep(self.config.modal_open).await;

        let Some((url, locator)) = locate_full_image(
            driver,
            &self.locators,
            self.config.locator_timeout,
            self.config.locator_poll,
        )
        .await
        else {
            return Ok(ItemOutcome::NoImage);
        };

        if !wait_for_image_load(driver, &url, self.config.image_load_timeout, self.config.locator_poll).await {
            debug!(url = %url, "Image load signal not seen; downloading anyway");
        }

        let download_url = upgrade_resolution(&url);
        debug!(position, locator, url = %download_url, "Downloading");
        let bytes = self.source.fetch_bytes(&download_url).await?;

        let outcome = match store.persist(&bytes, &mut state.known_digests)? {
            PersistOutcome::Saved(path) => ItemOutcome::Saved(path),
            PersistOutcome::Duplicate => ItemOutcome::Duplicate,
            PersistOutcome::NoOpenSlot => ItemOutcome::NoOpenSlot,
        };
        Ok(outcome)
    }

    // * Close control, then Escape, then history back; never fails the run
    async fn close_overlay(&self, driver: &L::Driver) {
        let mut closed = false;
        for control in CLOSE_CONTROLS {
            if driver.click(control).await.is_ok() {
                debug!(control, "Overlay closed");
                closed = true;
                break;
            }
        }

        if !closed {
            match driver.press_escape().await {
                Ok(()) => debug!("Overlay dismissed with Escape"),
                Err(e) => {
                    debug!(error = %e, "Escape failed; navigating back");
                    if let Err(e) = driver.evaluate(HISTORY_BACK_JS).await {
                        debug!(error = %e, "History back failed");
                    }
                }
            }
        }

        tokio::time::sleep(self.config.overlay_close).await;
    }
}
