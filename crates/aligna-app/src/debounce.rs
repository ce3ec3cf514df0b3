// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Trailing-edge debouncing of corner drags.

use std::time::{Duration, Instant};

use aligna_core::CornerSet;
use aligna_core::config::SessionConfig;

/// Coalesces a burst of corner moves into a single update.
///
/// Each [`push`](Self::push) replaces the pending corners and restarts the
/// quiet period. [`poll`](Self::poll) hands the corners out once the quiet
/// period has passed without a new move; [`release`](Self::release) (pointer
/// up) hands them out immediately. Time is passed in by the caller.
#[derive(Debug, Clone)]
pub struct CornerDebouncer {
    quiet: Duration,
    pending: Option<(CornerSet, Instant)>,
}

impl CornerDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(Duration::from_millis(config.debounce_ms))
    }

    pub fn push(&mut self, corners: CornerSet, now: Instant) {
        self.pending = Some((corners, now));
    }

    pub fn poll(&mut self, now: Instant) -> Option<CornerSet> {
        match self.pending {
            Some((corners, last)) if now.saturating_duration_since(last) >= self.quiet => {
                self.pending = None;
                Some(corners)
            }
            _ => None,
        }
    }

    pub fn release(&mut self) -> Option<CornerSet> {
        self.pending.take().map(|(corners, _)| corners)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
