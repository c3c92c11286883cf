//! Reeltape - Multi-Track Reel-to-Reel Tape Machine
//!
//! Reeltape records and loads audio clips ("tapes"), each with its own
//! transport, and plays, scrubs, reverses, copies and mixes them.
//!
//! # Architecture
//!
//! - [`engine`]: tape buffers, the engine clock, per-tape transport,
//!   playback sources, recording sessions and WAV I/O
//! - [`session`]: the [`Deck`](session::Deck) that owns tapes, clock,
//!   input and the active recording
//! - [`controls`]: slider/button models, value mappings and reel-path scrub
//!   geometry for whatever front end draws the machine
//! - [`input`]: live microphone input (cpal, behind the `live-input` feature)
//! - [`cli`]: the `reeltape-cli` command-line front end

pub mod cli;
pub mod config;
pub mod controls;
pub mod engine;
pub mod error;
pub mod input;
pub mod session;

pub use config::DeckConfig;
pub use error::{ReelError, Result};
pub use session::{Deck, TapeId};
