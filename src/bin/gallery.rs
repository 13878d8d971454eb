use std::process::ExitCode;

use eroom_harvest::config::GalleryConfig;
use eroom_harvest::gallery::{exit_status, AcquisitionPipeline, ChromiumLauncher};
use eroom_harvest::network::FastClient;
use eroom_harvest::ops::init_tracing;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    let client = match FastClient::new() {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "HTTP client initialisation failed");
            return ExitCode::from(1);
        }
    };

    let pipeline = AcquisitionPipeline::new(GalleryConfig::default(), ChromiumLauncher::default(), client);
    let result = pipeline.run(|key| std::env::var(key).ok()).await;

    if let Err(e) = &result {
        tracing::error!(error = %e, "Photo acquisition failed");
    }
    ExitCode::from(exit_status(&result))
}
