//! # Virtual Car ECU Simulator
//!
//! A virtual Engine Control Unit for exercising external diagnostic testers:
//! plausible engine and electrical telemetry, a per-code fault memory, and a
//! seed/key security-access gate in front of all dynamic data.
//!
//! ## Features
//!
//! - **Engine simulation**: rpm, power, torque, speed, fluid levels, coolant
//!   temperature, and fuel consumption with realistic jitter
//! - **Fault memory**: active/passive fault state per diagnostic trouble code,
//!   plus an occurrence counter log
//! - **Security access**: seed/key challenge-response; locked testers only see
//!   a fixed sentinel snapshot
//! - **OBD mailbox**: single-record JSON input/output files, replaced
//!   atomically every cycle
//!
//! ## Quick start
//!
//! ```rust
//! use ecusim::{EcuAgent, EcuConfig, InputFrame};
//!
//! let mut config = EcuConfig::default();
//! config.debug_access = true; // skip the seed/key handshake
//!
//! let mut agent = EcuAgent::new(config);
//! let snapshot = agent.run_cycle(&InputFrame::default());
//! println!("rpm: {}", snapshot.engine_info.rpm);
//! ```
//!
//! ## Architecture
//!
//! - [`agent`] - Cycle orchestration and snapshot assembly
//! - [`systems`] - Engine and power-supply signal models
//! - [`fault`] - Fault memory and fault log state machine
//! - [`security`] - Seed/key generation and verification
//! - [`protocol`] - Mailbox input/output record types
//! - [`mailbox`] - File-based single-record mailbox
//! - [`catalog`] - The closed diagnostic trouble-code catalog
//! - [`config`] - Defaults, config file loading, and validation

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

pub mod agent;
pub mod catalog;
pub mod config;
pub mod fault;
pub mod mailbox;
pub mod protocol;
pub mod security;
pub mod systems;

// Re-export main public types for convenience
pub use agent::EcuAgent;
pub use config::EcuConfig;
pub use fault::{FaultMemory, FaultState};
pub use protocol::{InputFrame, Snapshot};
pub use security::{SecurityGate, SecurityState, SeedSpec};
