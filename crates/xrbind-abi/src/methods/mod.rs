//! Per-command call projections.
//!
//! Every command gets a `*_raw` projection that returns the raw code and
//! writes through caller-provided outputs, and a value projection that hands
//! the code to the active result policy. Commands that create a handle also
//! get a `*_unique` projection (feature `smart-handle`) whose handle is
//! destroyed through the same dispatcher on drop.
//!
//! All projections are `unsafe`: they forward to [`crate::dispatch::Dispatch`]
//! and inherit its contract. Handles passed in must be live and created
//! through the dispatcher given.

mod free;
mod hand_tracking;
mod instance;
mod session;
mod space;

pub use free::*;

use xrbind_core::ResultCode;

/// Success codes of session-state commands.
pub const SESSION_SUCCESS_CODES: &[ResultCode] =
    &[ResultCode::SUCCESS, ResultCode::SESSION_LOSS_PENDING];
