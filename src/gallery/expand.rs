// * Scroll-until-stable expansion of a lazily loaded gallery.

use tracing::{debug, info, warn};

use super::driver::PageDriver;
use super::locator::{best_thumbnail_match, ThumbnailStrategy};
use crate::config::ExpansionConfig;

const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight); true";
const SCROLL_HEIGHT_JS: &str = "document.documentElement.scrollHeight";

/// Why the expansion loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionExit {
    TargetReached,
    Plateau,
    IterationCap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionOutcome {
    pub exit: ExpansionExit,
    pub iterations: usize,
    pub final_count: usize,
    pub scroll_height: Option<u64>,
}

/// Convergence bookkeeping, separate from the scrolling so it can be reasoned about alone.
#[derive(Debug, Clone)]
pub struct ExpansionTracker {
    target: usize,
    plateau_limit: usize,
    max_iterations: usize,
    best: usize,
    stalled: usize,
    iterations: usize,
}

impl ExpansionTracker {
    pub fn new(config: &ExpansionConfig, initial_count: usize) -> Self {
        Self {
            target: config.target_count,
            plateau_limit: config.plateau_limit.max(1),
            max_iterations: config.max_iterations,
            best: initial_count,
            stalled: 0,
            iterations: 0,
        }
    }

    // * Checked before any scrolling
    pub fn initial_exit(&self) -> Option<ExpansionExit> {
        if self.best >= self.target {
            Some(ExpansionExit::TargetReached)
        } else if self.max_iterations == 0 {
            Some(ExpansionExit::IterationCap)
        } else {
            None
        }
    }

    /// Records the count measured after one scroll iteration.
    pub fn observe(&mut self, count: usize) -> Option<ExpansionExit> {
        self.iterations += 1;

        if count > self.best {
            self.best = count;
            self.stalled = 0;
        } else {
            self.stalled += 1;
        }

        if count >= self.target {
            Some(ExpansionExit::TargetReached)
        } else if self.stalled >= self.plateau_limit {
            Some(ExpansionExit::Plateau)
        } else if self.iterations >= self.max_iterations {
            Some(ExpansionExit::IterationCap)
        } else {
            None
        }
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn best(&self) -> usize {
        self.best
    }
}

async fn measure<D: PageDriver>(
    driver: &D,
    strategies: &[ThumbnailStrategy],
    min_viable: usize,
) -> (usize, Option<u64>) {
    let count = best_thumbnail_match(driver, strategies, min_viable)
        .await
        .map_or(0, |m| m.count);
    let height = driver
        .evaluate(SCROLL_HEIGHT_JS)
        .await
        .ok()
        .and_then(|v| v.as_u64());
    (count, height)
}

/// Scrolls until the thumbnail count reaches the target, stops growing, or the
/// iteration budget runs out.
pub async fn expand<D: PageDriver>(
    driver: &D,
    strategies: &[ThumbnailStrategy],
    min_viable: usize,
    config: &ExpansionConfig,
) -> ExpansionOutcome {
    let (initial, mut scroll_height) = measure(driver, strategies, min_viable).await;
    let mut tracker = ExpansionTracker::new(config, initial);
    let mut final_count = initial;

    let exit = match tracker.initial_exit() {
        Some(exit) => exit,
        None => loop {
            if let Err(e) = driver.evaluate(SCROLL_TO_BOTTOM_JS).await {
                warn!(error = %e, "Scroll to bottom failed");
            }
            tokio::time::sleep(config.pause).await;

            for offset in &config.extra_offsets {
                if let Err(e) = driver
                    .evaluate(&format!("window.scrollBy(0, {}); true", offset))
                    .await
                {
                    warn!(offset, error = %e, "Offset scroll failed");
                }
                tokio::time::sleep(config.pause).await;
            }

            let (count, height) = measure(driver, strategies, min_viable).await;
            final_count = count;
            scroll_height = height.or(scroll_height);
            debug!(
                iteration = tracker.iterations() + 1,
                count,
                scroll_height = ?height,
                "Expansion step"
            );

            if let Some(exit) = tracker.observe(count) {
                break exit;
            }
        },
    };

    let outcome = ExpansionOutcome {
        exit,
        iterations: tracker.iterations(),
        final_count,
        scroll_height,
    };
    info!(
        exit = ?outcome.exit,
        iterations = outcome.iterations,
        count = outcome.final_count,
        best = tracker.best(),
        "Gallery expansion finished"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::driver::fake::FakePage;
    use crate::gallery::locator::THUMBNAIL_STRATEGIES;
    use serde_json::json;
    use std::time::Duration;

    fn config(target: usize, plateau: usize, max: usize) -> ExpansionConfig {
        ExpansionConfig {
            max_iterations: max,
            plateau_limit: plateau,
            target_count: target,
            pause: Duration::ZERO,
            extra_offsets: vec![],
        }
    }

    fn run(tracker: &mut ExpansionTracker, counts: &[usize]) -> Option<(ExpansionExit, usize)> {
        for &count in counts {
            if let Some(exit) = tracker.observe(count) {
                return Some((exit, tracker.iterations()));
            }
        }
        None
    }

    #[test]
    fn test_target_reached() {
        let mut tracker = ExpansionTracker::new(&config(30, 3, 15), 8);
        assert_eq!(
            run(&mut tracker, &[12, 20, 31, 40]),
            Some((ExpansionExit::TargetReached, 3))
        );
    }

    #[test]
    fn test_plateau_after_consecutive_stalls() {
        let mut tracker = ExpansionTracker::new(&config(100, 3, 15), 8);
        // * Growth at step 2 resets the stall run
        assert_eq!(
            run(&mut tracker, &[8, 12, 12, 11, 12, 50]),
            Some((ExpansionExit::Plateau, 5))
        );
        assert_eq!(tracker.best(), 12);
    }

    #[test]
    fn test_iteration_cap() {
        let mut tracker = ExpansionTracker::new(&config(1000, 3, 4), 0);
        assert_eq!(
            run(&mut tracker, &[10, 20, 30, 40, 50]),
            Some((ExpansionExit::IterationCap, 4))
        );
    }

    #[test]
    fn test_initial_exit() {
        assert_eq!(
            ExpansionTracker::new(&config(10, 3, 5), 10).initial_exit(),
            Some(ExpansionExit::TargetReached)
        );
        assert_eq!(
            ExpansionTracker::new(&config(10, 3, 0), 2).initial_exit(),
            Some(ExpansionExit::IterationCap)
        );
        assert_eq!(ExpansionTracker::new(&config(10, 3, 5), 2).initial_exit(), None);
    }

    #[tokio::test]
    async fn test_expand_stops_at_target() {
        let page = FakePage::default()
            .with_count_sequence(&THUMBNAIL_STRATEGIES[0].selector(), &[5, 10, 20, 35])
            .with_script("documentElement.scrollHeight", json!(5200));
        let mut settings = config(30, 3, 15);
        settings.extra_offsets = vec![800];

        let outcome = expand(&page, THUMBNAIL_STRATEGIES, 3, &settings).await;
        assert_eq!(
            outcome,
            ExpansionOutcome {
                exit: ExpansionExit::TargetReached,
                iterations: 3,
                final_count: 35,
                scroll_height: Some(5200),
            }
        );

        let evaluated = page.evaluated.lock().unwrap();
        assert_eq!(evaluated.iter().filter(|s| s.contains("scrollTo")).count(), 3);
        assert_eq!(evaluated.iter().filter(|s| s.contains("scrollBy(0, 800)")).count(), 3);
    }

    #[tokio::test]
    async fn test_expand_detects_plateau() {
        let page = FakePage::default()
            .with_count_sequence(&THUMBNAIL_STRATEGIES[0].selector(), &[4, 9, 9, 9, 9, 40]);

        let outcome = expand(&page, THUMBNAIL_STRATEGIES, 3, &config(30, 3, 15)).await;
        assert_eq!(outcome.exit, ExpansionExit::Plateau);
        assert_eq!(outcome.iterations, 4);
        assert_eq!(outcome.final_count, 9);
        assert_eq!(outcome.scroll_height, None);
    }

    #[tokio::test]
    async fn test_expand_skips_scrolling_when_already_at_target() {
        let page = FakePage::default().with_count(&THUMBNAIL_STRATEGIES[0].selector(), 50);

        let outcome = expand(&page, THUMBNAIL_STRATEGIES, 3, &config(30, 3, 15)).await;
        assert_eq!(outcome.exit, ExpansionExit::TargetReached);
        assert_eq!(outcome.iterations, 0);
        assert!(!page
            .evaluated
            .lock()
            .unwrap()
            .iter()
            .any(|s| s.contains("scrollTo")));
    }
}
