// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// aligna-app: the consumer side of the scanner. Holds per-document session
// state, debounces corner drags, and persists settings.

pub mod debounce;
pub mod services;
pub mod session;

pub use debounce::CornerDebouncer;
pub use session::{DocumentSession, RenderedPage};
