//! One-shot resolution guard.
//!
//! Every signal source (poller, deadline, operator) must win [`ResolutionGuard::try_claim`]
//! before it touches the order. The claim is a single compare-and-swap; whoever loses
//! treats the order as already resolved.
//!
//! ```text
//!            claim(Complete)            settle
//!   Open ─────────────────▶ Completing ───────▶ Completed
//!    │  ▲                       │
//!    │  └──────── release ──────┘
//!    │
//!    │  claim(Cancel)               settle
//!    └─────────────────▶ Cancelling ───────▶ Cancelled
//!       ▲                    │
//!       └──── release ───────┘   (only while the order itself is not yet cancelled)
//! ```
//!
//! A claim that fails half-way (order cancelled, payment not voided) stays in
//! `Cancelling`; re-claiming with the same intent returns [`Claim::Resumed`] so the
//! remaining step can be retried, while a completion attempt is refused.

use std::sync::atomic::{AtomicU8, Ordering};

const OPEN: u8 = 0;
const COMPLETING: u8 = 1;
const CANCELLING: u8 = 2;
const COMPLETED: u8 = 3;
const CANCELLED: u8 = 4;

/// Which terminal state a signal source is driving towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Complete,
    Cancel,
}

impl Intent {
    fn claimed(self) -> u8 {
        match self {
            Intent::Complete => COMPLETING,
            Intent::Cancel => CANCELLING,
        }
    }

    fn settled(self) -> u8 {
        match self {
            Intent::Complete => COMPLETED,
            Intent::Cancel => CANCELLED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// First claim: the caller owns resolution.
    Won,
    /// A claim with the same intent is still outstanding; the caller resumes it.
    Resumed,
    /// Another source got there first. Nothing to do.
    Lost,
}

#[derive(Debug, Default)]
pub struct ResolutionGuard {
    state: AtomicU8,
}

impl ResolutionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_claim(&self, intent: Intent) -> Claim {
        match self
            .state
            .compare_exchange(OPEN, intent.claimed(), Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Claim::Won,
            Err(current) if current == intent.claimed() => Claim::Resumed,
            Err(_) => Claim::Lost,
        }
    }

    /// Gives an unfinished claim back, re-opening the order to every signal source.
    pub fn release(&self, intent: Intent) -> bool {
        self.state
            .compare_exchange(intent.claimed(), OPEN, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Marks a claim as finished. Permanent.
    pub fn settle(&self, intent: Intent) -> bool {
        self.state
            .compare_exchange(
                intent.claimed(),
                intent.settled(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// True while no source holds or has finished a claim.
    pub fn is_open(&self) -> bool {
        self.state.load(Ordering::Acquire) == OPEN
    }
}
