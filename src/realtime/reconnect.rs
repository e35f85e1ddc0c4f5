use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushChannelOptions {
    pub reconnect: bool,
    pub reconnect_interval: Duration,
    pub max_reconnect_attempts: u32,
}

impl Default for PushChannelOptions {
    fn default() -> Self {
        Self {
            reconnect: true,
            reconnect_interval: Duration::from_millis(3000),
            max_reconnect_attempts: 5,
        }
    }
}

/// Bounded reconnect bookkeeping for one channel.
///
/// The counter grows by one per scheduled retry and drops back to zero
/// whenever a connection opens, so `max_reconnect_attempts` bounds
/// consecutive failures rather than the lifetime total.
#[derive(Debug, Default)]
pub struct ReconnectState {
    attempts: u32,
}

impl ReconnectState {
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn on_open(&mut self) {
        self.attempts = 0;
    }

    /// The delay before the next attempt, or `None` when the channel should
    /// stay down.
    pub fn next_delay(&mut self, options: &PushChannelOptions) -> Option<Duration> {
        if !options.reconnect || self.attempts >= options.max_reconnect_attempts {
            return None;
        }
        self.attempts += 1;
        Some(options.reconnect_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_after_max_attempts() {
        let options = PushChannelOptions {
            max_reconnect_attempts: 2,
            ..Default::default()
        };
        let mut state = ReconnectState::default();
        assert_eq!(state.next_delay(&options), Some(Duration::from_millis(3000)));
        assert_eq!(state.next_delay(&options), Some(Duration::from_millis(3000)));
        assert_eq!(state.next_delay(&options), None);
        assert_eq!(state.attempts(), 2);
    }

    #[test]
    fn open_resets_the_counter() {
        let options = PushChannelOptions {
            max_reconnect_attempts: 1,
            ..Default::default()
        };
        let mut state = ReconnectState::default();
        assert!(state.next_delay(&options).is_some());
        assert!(state.next_delay(&options).is_none());
        state.on_open();
        assert!(state.next_delay(&options).is_some());
    }

    #[test]
    fn disabled_never_retries() {
        let options = PushChannelOptions {
            reconnect: false,
            ..Default::default()
        };
        assert_eq!(ReconnectState::default().next_delay(&options), None);
    }
}
