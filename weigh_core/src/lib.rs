#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Stable-weight reading (hardware-agnostic).
//!
//! This crate turns a stream of delimiter-separated scale frames into a single
//! stable weight. All I/O goes through the `weigh_traits::FrameSource` trait.
//!
//! ## Architecture
//!
//! - **Weight**: exact decimal readings (`weight` module)
//! - **Validation**: length, header, identifier and weight-field checks (`frame` module)
//! - **Stability**: N identical consecutive readings (`stability` module)
//! - **Session**: start/stop/restart state machine with a pending result (`session` module)
//! - **Runner**: start, wait with timeout or cancel flag, stop (`runner` module)
//!
//! ## Decimal equality
//!
//! Readings are compared as decimals, never as `f64`: `50.0`, `50.00` and
//! `050.0` are the same reading, `50.0` and `50.1` are not.

pub mod builder;
pub mod config;
pub mod conversions;
pub mod error;
pub mod frame;
pub mod hw_error;
pub mod mocks;
pub mod pending;
pub mod runner;
pub mod session;
pub mod stability;
pub mod status;
pub mod util;
pub mod weight;

pub use builder::ReadSessionBuilder;
pub use config::{SessionCfg, StreamErrorPolicy};
pub use error::{BuildError, FrameDiscard, ReadError};
pub use frame::{ParsedReading, validate};
pub use pending::PendingWeight;
pub use runner::{read_stable, read_stable_default, read_stable_until};
pub use session::{ReadSession, StopHandle};
pub use stability::{DEFAULT_STABLE_COUNT, Observation, StabilityState, StabilityTracker};
pub use status::{Diagnostic, SessionPhase};
pub use weight::{ParseWeightError, Weight};
