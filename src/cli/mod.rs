//! CLI Module
//!
//! Command-line interface for offline work with tapes.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reeltape - multi-track reel-to-reel tape machine
#[derive(Parser, Debug)]
#[command(name = "reeltape-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Deck configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show name, duration and sample count of an audio file
    #[command(name = "info")]
    Info {
        /// Audio file to inspect
        file: PathBuf,
    },

    /// Load tapes, play them together and write the mixdown
    #[command(name = "render")]
    Render {
        /// Audio files, one tape each
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Seconds of audio to render
        #[arg(short, long, default_value_t = 10.0)]
        seconds: f64,

        /// Signed playback rate for every tape (negative plays in reverse)
        #[arg(short, long, default_value_t = 1.0, allow_hyphen_values = true)]
        rate: f64,

        /// Output gain per tape in dB
        #[arg(short, long, default_value_t = 0.0, allow_hyphen_values = true)]
        gain: f64,

        /// Start position in seconds
        #[arg(long, default_value_t = 0.0)]
        start: f64,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,

        /// Output bit depth (16, 24 or 32)
        #[arg(long, default_value_t = 24)]
        bits: u16,
    },

    /// Play a tape backwards once and write the result
    #[command(name = "reverse")]
    Reverse {
        /// Audio file to reverse
        file: PathBuf,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Record a file through the recording session as if it were live input
    #[command(name = "record")]
    Record {
        /// Audio file fed to the recorder
        #[arg(long)]
        from: PathBuf,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,
    },
}
