// * Headless Chromium session backing the acquisition pipeline.
// * Uses ChromiumOxide; the CDP handler is pumped on a background task for the session's lifetime.

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::driver::{DriverError, DriverLauncher, PageDriver};
use crate::config::constants::PAGE_TIMEOUT_MS;
use crate::network::IdentityProfile;

// * Installed on every new document so automation markers never reach page scripts
const STEALTH_PAYLOAD: &str = r#"
(() => {
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined,
        configurable: true
    });

    Object.defineProperty(navigator, 'languages', {
        get: () => ['ja-JP', 'ja', 'en-US', 'en'],
        configurable: true
    });

    Object.defineProperty(navigator, 'plugins', {
        get: () => [1, 2, 3],
        configurable: true
    });

    window.chrome = window.chrome || { runtime: {} };
})();
"#;

const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 1800;

/// Launches headless Chromium sessions with the shared identity.
pub struct ChromiumLauncher {
    identity: IdentityProfile,
}

impl ChromiumLauncher {
    pub fn new(identity: IdentityProfile) -> Self {
        Self { identity }
    }
}

impl Default for ChromiumLauncher {
    fn default() -> Self {
        Self::new(IdentityProfile::desktop_chrome())
    }
}

impl DriverLauncher for ChromiumLauncher {
    type Driver = BrowserSession;

    async fn launch(&self) -> Result<BrowserSession, DriverError> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
            .viewport(None)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-notifications")
            .arg("--lang=ja-JP")
            .arg(self.identity.browser_arg())
            .build()
            .map_err(DriverError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;

        // * Spawn handler in background
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler event error: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handle.abort();
                return Err(DriverError::Launch(e.to_string()));
            }
        };

        if let Err(e) = page
            .evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_PAYLOAD))
            .await
        {
            warn!("Stealth payload not installed: {}", e);
        }

        info!("Browser session launched");
        Ok(BrowserSession {
            browser,
            page,
            handler: handle,
        })
    }
}

/// One browser with one working tab.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: tokio::task::JoinHandle<()>,
}

impl BrowserSession {
    async fn first(&self, selector: &str) -> Result<Element, DriverError> {
        self.page
            .find_element(selector)
            .await
            .map_err(|_| DriverError::ElementNotFound(selector.to_string()))
    }

    async fn all(&self, selector: &str) -> Result<Vec<Element>, DriverError> {
        self.page
            .find_elements(selector)
            .await
            .map_err(|e| DriverError::Interaction(format!("{}: {}", selector, e)))
    }
}

impl PageDriver for BrowserSession {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        let timeout = Duration::from_millis(PAGE_TIMEOUT_MS);

        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {
                debug!(url, "Navigated");
                Ok(())
            }
            Ok(Err(e)) => Err(DriverError::Navigation(e.to_string())),
            Err(_) => Err(DriverError::Timeout(PAGE_TIMEOUT_MS)),
        }
    }

    async fn type_into(&self, selector: &str, text: &str) -> Result<(), DriverError> {
        let element = self.first(selector).await?;
        element
            .click()
            .await
            .map_err(|e| DriverError::Interaction(e.to_string()))?;
        element
            .type_str(text)
            .await
            .map_err(|e| DriverError::Interaction(e.to_string()))?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        self.first(selector)
            .await?
            .click()
            .await
            .map_err(|e| DriverError::Interaction(e.to_string()))?;
        Ok(())
    }

    async fn click_nth(&self, selector: &str, index: usize) -> Result<(), DriverError> {
        let elements = self.all(selector).await?;
        let element = elements
            .get(index)
            .ok_or_else(|| DriverError::ElementNotFound(format!("{}[{}]", selector, index)))?;

        element
            .scroll_into_view()
            .await
            .map_err(|e| DriverError::Interaction(e.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| DriverError::Interaction(e.to_string()))?;
        Ok(())
    }

    async fn count(&self, selector: &str) -> Result<usize, DriverError> {
        Ok(self.all(selector).await?.len())
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>, DriverError> {
        let elements = self.all(selector).await?;
        match elements.first() {
            Some(element) => element
                .attribute(name)
                .await
                .map_err(|e| DriverError::Interaction(e.to_string())),
            None => Ok(None),
        }
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, DriverError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| DriverError::Script(e.to_string()))?;

        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn press_escape(&self) -> Result<(), DriverError> {
        self.first("body")
            .await?
            .press_key("Escape")
            .await
            .map_err(|e| DriverError::Interaction(e.to_string()))?;
        Ok(())
    }

    async fn close(mut self) -> Result<(), DriverError> {
        let result = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| DriverError::Shutdown(e.to_string()));
        if result.is_ok() {
            let _ = self.browser.wait().await;
        }
        self.handler.abort();
        info!("Browser session closed");
        result
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // * Best effort cleanup - can't await in drop
        self.handler.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stealth_payload_masks_webdriver() {
        assert!(STEALTH_PAYLOAD.contains("webdriver"));
        assert!(STEALTH_PAYLOAD.contains("languages"));
        assert!(STEALTH_PAYLOAD.contains("plugins"));
    }

    #[test]
    fn test_launcher_carries_identity_user_agent() {
        let launcher = ChromiumLauncher::default();
        assert!(launcher.identity.browser_arg().starts_with("--user-agent="));
    }
}
