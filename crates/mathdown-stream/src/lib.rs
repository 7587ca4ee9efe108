//! Streaming layer over the mathdown render pipeline.
//!
//! Owns everything time- and turn-shaped: per-turn buffers, the debounce
//! timer that coalesces bursty token arrival into bounded-rate render
//! passes, the guaranteed single final pass when a stream ends, and abort
//! handling. Output is a stream of [`events::RenderUpdate`]s; the pipeline
//! itself stays pure.

pub mod config;
pub mod events;
pub mod router;

mod session;

pub use config::{Config, StreamConfig};
pub use events::{RenderUpdate, TurnId};
pub use router::RenderRouter;
