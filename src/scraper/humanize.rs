//! Randomized pacing for page interaction
//!
//! All randomness used while driving a page comes from here. With
//! humanizing off every delay is zero and each round scrolls exactly one
//! viewport, which keeps tests and fast runs deterministic.

use std::ops::RangeInclusive;
use std::time::Duration;

use rand::Rng;

const SCROLL_STEPS: RangeInclusive<u32> = 2..=5;
const SCROLL_MIN_PX: u32 = 300;
const STEP_PAUSE_MS: RangeInclusive<u64> = 800..=2200;
const ROUND_DELAY_MS: RangeInclusive<u64> = 1800..=4200;
const WARMUP_PAUSE_MS: RangeInclusive<u64> = 1500..=3500;
const COOLDOWN_MS: RangeInclusive<u64> = 3000..=8000;

/// One wheel-style scroll followed by a pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollStep {
    pub pixels: u32,
    pub pause: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Humanizer {
    enabled: bool,
}

impl Humanizer {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Scroll steps for one round.
    ///
    /// Each step moves between 300 px and `viewport - 200` px.
    #[must_use]
    pub fn scroll_plan(&self, viewport_height: u32) -> Vec<ScrollStep> {
        if !self.enabled {
            return vec![ScrollStep {
                pixels: viewport_height.max(SCROLL_MIN_PX),
                pause: Duration::ZERO,
            }];
        }

        let mut rng = rand::rng();
        let max_px = viewport_height.saturating_sub(200).max(SCROLL_MIN_PX);
        let steps = rng.random_range(SCROLL_STEPS);
        (0..steps)
            .map(|_| ScrollStep {
                pixels: rng.random_range(SCROLL_MIN_PX..=max_px),
                pause: Duration::from_millis(rng.random_range(STEP_PAUSE_MS)),
            })
            .collect()
    }

    /// Random pointer target inside the viewport.
    #[must_use]
    pub fn pointer_target(&self, width: u32, height: u32) -> Option<(f64, f64)> {
        if !self.enabled {
            return None;
        }
        let mut rng = rand::rng();
        let x = rng.random_range(100..=width.saturating_sub(100).max(101));
        let y = rng.random_range(100..=height.saturating_sub(100).max(101));
        Some((f64::from(x), f64::from(y)))
    }

    /// Pause after extracting one round of cards.
    #[must_use]
    pub fn round_delay(&self) -> Duration {
        self.pick(ROUND_DELAY_MS)
    }

    /// Pause between the home page and the search page.
    #[must_use]
    pub fn warmup_pause(&self) -> Duration {
        self.pick(WARMUP_PAUSE_MS)
    }

    /// Cool-down a topic slot observes before the next topic starts.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.pick(COOLDOWN_MS)
    }

    fn pick(&self, range: RangeInclusive<u64>) -> Duration {
        if self.enabled {
            Duration::from_millis(rand::rng().random_range(range))
        } else {
            Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_is_deterministic() {
        let h = Humanizer::new(false);
        assert_eq!(h.round_delay(), Duration::ZERO);
        assert_eq!(h.cooldown(), Duration::ZERO);
        assert_eq!(h.pointer_target(1920, 1080), None);
        assert_eq!(
            h.scroll_plan(1080),
            vec![ScrollStep {
                pixels: 1080,
                pause: Duration::ZERO
            }]
        );
    }

    #[test]
    fn enabled_stays_in_bounds() {
        let h = Humanizer::new(true);
        for _ in 0..50 {
            let plan = h.scroll_plan(1080);
            assert!((2..=5).contains(&plan.len()));
            for step in plan {
                assert!((300..=880).contains(&step.pixels));
                assert!(step.pause >= Duration::from_millis(800));
                assert!(step.pause <= Duration::from_millis(2200));
            }
            let delay = h.round_delay();
            assert!(delay >= Duration::from_millis(1800) && delay <= Duration::from_millis(4200));
            let cooldown = h.cooldown();
            assert!(cooldown >= Duration::from_secs(3) && cooldown <= Duration::from_secs(8));
        }
    }
}
