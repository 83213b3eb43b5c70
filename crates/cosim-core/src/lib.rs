//! `cosim-core` — foundational types for the `rust_cosim` co-simulation kernel.
//!
//! This crate is a dependency of every other `cosim-*` crate.  It intentionally
//! has no `cosim-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `ObjectId`, `Rank`                                    |
//! | [`time`]        | `Timestamp` (+ `NEVER`/`INVALID` sentinels), `RunConfig` |
//! | [`pass`]        | `Pass`, `PassSet` capability flags                    |
//! | [`rng`]         | `SimRng` (deterministic, seed-mixed)                  |
//! | [`error`]       | `CosimError`, `CosimResult`                           |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod ids;
pub mod pass;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CosimError, CosimResult};
pub use ids::{ObjectId, Rank};
pub use pass::{Pass, PassSet};
pub use rng::SimRng;
pub use time::{RunConfig, Timestamp};
