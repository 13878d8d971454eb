use std::process::ExitCode;

use eroom_harvest::config::ExtractorConfig;
use eroom_harvest::network::FastClient;
use eroom_harvest::ops::init_tracing;
use eroom_harvest::testimonials::TestimonialExtractor;

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

    let extractor = TestimonialExtractor::new(client, ExtractorConfig::default());
    match extractor.run().await {
        Ok(Some(path)) => {
            tracing::info!(path = %path.display(), "Testimonial scrape complete");
            ExitCode::SUCCESS
        }
        Ok(None) => {
            tracing::info!("Testimonial scrape produced no output");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Testimonial scrape failed");
            ExitCode::from(1)
        }
    }
}
