//! Connectivity supervisors.
//!
//! Each supervisor owns the [`ConnectivityState`] of one connection and is
//! the only thing that changes it.  `step()` performs at most one
//! transition and never sleeps; `ensure_up()` composes `step()` with the
//! clock's delay and is what the scheduling loop calls.
//!
//! ```text
//!            begin / connect
//!   Down ─────────────────────▶ Recovering ──(status ok)──▶ Up
//!    ▲                              │                        │
//!    └──────(link lost)─────────────┴──────(dropped)─────────┘
//! ```

pub mod link;
pub mod session;

pub use link::{LinkOutcome, LinkSupervisor};
pub use session::SessionSupervisor;

/// Per-connection readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityState {
    #[default]
    Down,
    Recovering,
    Up,
}
