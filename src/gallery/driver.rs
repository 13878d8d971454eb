// * The browser seam: everything the acquisition pipeline needs from a live page.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Page navigation failed: {0}")]
    Navigation(String),

    #[error("Page timeout after {0}ms")]
    Timeout(u64),

    #[error("No element matches {0:?}")]
    ElementNotFound(String),

    #[error("Element interaction failed: {0}")]
    Interaction(String),

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Browser shutdown failed: {0}")]
    Shutdown(String),
}

/// DOM primitives over one open page.
///
/// Selector arguments are CSS selectors evaluated against the current document.
#[allow(async_fn_in_trait)]
pub trait PageDriver {
    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    /// Focuses the first match and types `text` into it.
    async fn type_into(&self, selector: &str, text: &str) -> Result<(), DriverError>;

    async fn click(&self, selector: &str) -> Result<(), DriverError>;

    /// Scrolls the `index`th match into view and clicks it.
    async fn click_nth(&self, selector: &str, index: usize) -> Result<(), DriverError>;

    async fn count(&self, selector: &str) -> Result<usize, DriverError>;

    /// Attribute of the first match; `Ok(None)` when nothing matches or the attribute is absent.
    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>, DriverError>;

    /// Evaluates a script; `undefined` comes back as `Value::Null`.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, DriverError>;

    async fn press_escape(&self) -> Result<(), DriverError>;

    /// Releases the session. Called exactly once on every exit path.
    async fn close(self) -> Result<(), DriverError>
    where
        Self: Sized;
}

/// Starts a fresh browser session.
#[allow(async_fn_in_trait)]
pub trait DriverLauncher {
    type Driver: PageDriver;

    async fn launch(&self) -> Result<Self::Driver, DriverError>;
}

// * Quotes a Rust string as a JavaScript string literal
pub fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_escapes_quotes() {
        assert_eq!(js_string(r#"img[src="a"]"#), r#""img[src=\"a\"]""#);
        assert_eq!(js_string("plain"), "\"plain\"");
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::{DriverError, PageDriver};
    use serde_json::Value;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    // * Page answering from canned tables; unknown queries match nothing
    #[derive(Default)]
    pub(crate) struct FakePage {
        counts: HashMap<String, usize>,
        count_sequences: HashMap<String, Mutex<VecDeque<usize>>>,
        attributes: HashMap<(String, String), String>,
        scripts: Vec<(&'static str, Value)>,
        pub evaluated: Mutex<Vec<String>>,
    }

    impl FakePage {
        pub fn with_count(mut self, selector: &str, count: usize) -> Self {
            self.counts.insert(selector.to_string(), count);
            self
        }

        // * Successive counts; the last one repeats
        pub fn with_count_sequence(mut self, selector: &str, counts: &[usize]) -> Self {
            self.count_sequences
                .insert(selector.to_string(), Mutex::new(counts.iter().copied().collect()));
            self
        }

        pub fn with_attribute(mut self, selector: &str, name: &str, value: &str) -> Self {
            self.attributes
                .insert((selector.to_string(), name.to_string()), value.to_string());
            self
        }

        // * Scripts containing `needle` evaluate to `value`
        pub fn with_script(mut self, needle: &'static str, value: Value) -> Self {
            self.scripts.push((needle, value));
            self
        }
    }

    impl PageDriver for FakePage {
        async fn goto(&self, _url: &str) -> Result<(), DriverError> {
            Ok(())
        }

        async fn type_into(&self, _selector: &str, _text: &str) -> Result<(), DriverError> {
            Ok(())
        }

        async fn click(&self, selector: &str) -> Result<(), DriverError> {
            Err(DriverError::ElementNotFound(selector.to_string()))
        }

        async fn click_nth(&self, _selector: &str, _index: usize) -> Result<(), DriverError> {
            Ok(())
        }

        async fn count(&self, selector: &str) -> Result<usize, DriverError> {
            if let Some(sequence) = self.count_sequences.get(selector) {
                let mut sequence = sequence.lock().unwrap();
                let next = if sequence.len() > 1 {
                    sequence.pop_front()
                } else {
                    sequence.front().copied()
                };
                return Ok(next.unwrap_or(0));
            }
            Ok(self.counts.get(selector).copied().unwrap_or(0))
        }

        async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>, DriverError> {
            Ok(self
                .attributes
                .get(&(selector.to_string(), name.to_string()))
                .cloned())
        }

        async fn evaluate(&self, script: &str) -> Result<Value, DriverError> {
            self.evaluated.lock().unwrap().push(script.to_string());
            Ok(self
                .scripts
                .iter()
                .find(|(needle, _)| script.contains(*needle))
                .map(|(_, value)| value.clone())
                .unwrap_or(Value::Null))
        }

        async fn press_escape(&self) -> Result<(), DriverError> {
            Ok(())
        }

        async fn close(self) -> Result<(), DriverError> {
            Ok(())
        }
    }
}
