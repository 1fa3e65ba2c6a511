//! The online-state machine (C2, §4.1).

/// `Unknown | Healthy | Failed` (§3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OnlineState {
    Unknown,
    Healthy,
    Failed,
}

/// Sink notified only on genuine online-state transitions (§6
/// `OnlineStateDelegate`); never called after `shutdown()`.
pub trait OnlineStateDelegate: Send + Sync {
    fn on_watch_stream_online_state_changed(&self, new_state: OnlineState);
}

/// Tracks watch connectivity health and notifies a delegate on transitions.
///
/// `watch_failures` accompanies the state; a stream failure while not
/// `Healthy` increments it, and reaching `failure_threshold` forces `Failed`.
pub struct OnlineStateTracker {
    state: OnlineState,
    watch_failures: u32,
    failure_threshold: u32,
}

impl OnlineStateTracker {
    pub fn new(failure_threshold: u32) -> Self {
        Self {
            state: OnlineState::Unknown,
            watch_failures: 0,
            failure_threshold,
        }
    }

    pub fn state(&self) -> OnlineState {
        self.state
    }

    /// A message was received from the server: always `Healthy`, reset the
    /// failure counter (§4.1 first bullet; driven by `on_watch_change` step 1).
    pub fn mark_message_received(&mut self, delegate: Option<&dyn OnlineStateDelegate>) {
        self.transition_to(OnlineState::Healthy, delegate);
        self.watch_failures = 0;
    }

    /// The watch stream closed. `has_active_listens` reflects whether any
    /// target was still listened to at the moment of closure (§4.1 second
    /// bullet: "a healthy stream closes or has no active listens").
    pub fn handle_watch_stream_closed(&mut self, has_active_listens: bool, delegate: Option<&dyn OnlineStateDelegate>) {
        if self.state == OnlineState::Healthy || !has_active_listens {
            self.transition_to(OnlineState::Unknown, delegate);
            self.watch_failures = 0;
            return;
        }
        self.watch_failures += 1;
        if self.watch_failures >= self.failure_threshold {
            self.transition_to(OnlineState::Failed, delegate);
        }
    }

    /// Explicit `disable_network`/`shutdown` forces `Failed`, observably
    /// (§4.1 last bullet).
    pub fn force_failed(&mut self, delegate: Option<&dyn OnlineStateDelegate>) {
        self.transition_to(OnlineState::Failed, delegate);
    }

    /// `enable_network()` starts a fresh session in `Unknown` (§4.6), notifying
    /// the delegate when the previous state (typically `Failed`, left behind by
    /// `disable_network()`) actually differs, which is what gives R2 its second
    /// notification.
    pub fn mark_unknown(&mut self, delegate: Option<&dyn OnlineStateDelegate>) {
        self.transition_to(OnlineState::Unknown, delegate);
        self.watch_failures = 0;
    }

    fn transition_to(&mut self, new_state: OnlineState, delegate: Option<&dyn OnlineStateDelegate>) {
        if self.state == new_state {
            return;
        }
        log::debug!("online state transition: {:?} -> {:?}", self.state, new_state);
        self.state = new_state;
        if let Some(delegate) = delegate {
            delegate.on_watch_stream_online_state_changed(new_state);
        }
    }
}
