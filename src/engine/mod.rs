//! Engine module: runs toolchain pipelines and measures them.
//!
//! # Architecture
//!
//! - **timer**: `Timed` spans recorded into the run's `RuntimeRecord`.
//! - **runner**: `CommandRunner` executes one `Stage` (an external tool) with
//!   its working directory set to the output directory and logs it to
//!   `<stage>.txt`.
//! - **toolchain**: the `Toolchain` contract and the `Pipeline` state every
//!   variant shares.
//! - **arachne** / **vpr**: the two concrete stage sequences.
//! - **provenance**: tool version queries.

pub mod arachne;
pub mod provenance;
pub mod runner;
pub mod timer;
pub mod toolchain;
pub mod vpr;

// Re-export key types for convenience
pub use arachne::ArachneToolchain;
pub use runner::{CommandRunner, Stage};
pub use timer::Timed;
pub use toolchain::{Pipeline, RunState, Toolchain, create_toolchain};
pub use vpr::VprToolchain;
