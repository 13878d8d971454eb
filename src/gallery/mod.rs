// * Photo Acquisition Pipeline
// * Logs into the gallery site, opens a stride-sampled set of photos, and keeps a
// * bounded, deduplicated slideshow directory on disk.

pub mod browser;
pub mod driver;
pub mod expand;
pub mod locator;
pub mod pipeline;
pub mod sampling;
pub mod store;

pub use browser::{BrowserSession, ChromiumLauncher};
pub use driver::{DriverError, DriverLauncher, PageDriver};
pub use expand::{ExpansionExit, ExpansionOutcome, ExpansionTracker};
pub use pipeline::{AcquisitionPipeline, RunReport, RunState};
pub use store::{ImageStore, PersistOutcome, StoreError};

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("Missing credentials: {0}")]
    Config(#[from] ConfigError),

    #[error("Image store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("Browser failure: {0}")]
    Driver(#[from] DriverError),

    #[error("No gallery page could be loaded")]
    NoGallery,
}

/// Process exit status for a finished run: 0 on success, 1 on any failure.
pub fn exit_status(result: &Result<RunReport, AcquireError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
