//! Command-line interface definitions.
//!
//! Offline tooling around the router and the order manager: config checks,
//! order identities, trigger parameter encoding, appData hashing and
//! instruction layout planning.

use std::path::PathBuf;

use alloy_primitives::{Address, B256};
use clap::{Parser, Subcommand};

/// Atomic lending router and conditional order tooling
#[derive(Parser, Debug)]
#[command(name = "lendflow")]
#[command(version)]
pub struct Cli {
    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load and validate a configuration file
    CheckConfig {
        /// Path to the TOML configuration
        #[arg(default_value = "config.toml")]
        path: PathBuf,
    },

    /// Print the identity hash of a conditional order
    OrderHash {
        /// Order owner
        #[arg(long)]
        user: Address,
        /// Order salt (32 bytes, hex)
        #[arg(long)]
        salt: B256,
    },

    /// Encode or decode LTV trigger parameters
    #[command(subcommand)]
    Trigger(TriggerCommand),

    /// Work with order appData documents
    #[command(subcommand)]
    AppData(AppDataCommand),

    /// Check an instruction list and show the output slots it reads and appends
    Plan {
        /// JSON file holding an array of instructions
        path: PathBuf,
        /// Outputs pre-populated before the first instruction
        #[arg(long, default_value_t = 0)]
        seeds: usize,
    },
}

/// Trigger parameter codec.
#[derive(Subcommand, Debug)]
pub enum TriggerCommand {
    /// ABI-encode parameters from a JSON file
    Encode {
        /// JSON file with the parameter fields
        path: PathBuf,
    },
    /// Decode hex static data into JSON
    Decode {
        /// 0x-prefixed hex
        data: String,
    },
}

/// appData subcommands.
#[derive(Subcommand, Debug)]
pub enum AppDataCommand {
    /// Print the canonical JSON and its keccak256 hash
    Hash {
        /// appData JSON document
        path: PathBuf,
    },
}
