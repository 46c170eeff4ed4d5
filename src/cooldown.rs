// src/cooldown.rs

use serde::{Deserialize, Serialize};
use tokio::time::Duration;

/// Pause inserted after a failed download before the next entry starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CooldownPolicy {
    None,
    Fixed(Duration),
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        CooldownPolicy::Fixed(Duration::from_secs(1))
    }
}

impl CooldownPolicy {
    /// A zero delay means no cooldown at all.
    pub fn from_millis(ms: u64) -> Self {
        if ms == 0 {
            CooldownPolicy::None
        } else {
            CooldownPolicy::Fixed(Duration::from_millis(ms))
        }
    }

    pub fn delay(&self) -> Duration {
        match self {
            CooldownPolicy::None => Duration::ZERO,
            CooldownPolicy::Fixed(d) => *d,
        }
    }

    /// Sleeps for the configured delay.
    pub async fn wait(&self) {
        let delay = self.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn default_is_one_second() {
        assert_eq!(CooldownPolicy::default().delay(), Duration::from_secs(1));
    }

    #[test]
    fn zero_millis_disables() {
        assert_eq!(CooldownPolicy::from_millis(0), CooldownPolicy::None);
        assert_eq!(
            CooldownPolicy::from_millis(250).delay(),
            Duration::from_millis(250)
        );
    }

    #[tokio::test]
    async fn fixed_waits_at_least_the_delay() {
        let start = Instant::now();
        CooldownPolicy::Fixed(Duration::from_millis(30)).wait().await;
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
