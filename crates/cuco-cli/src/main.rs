//! Operator tool for issuing and checking CUCo device tickets.
//!
//! ```sh
//! cuco issue --config issuer.json --serial 8A1054AAC0A0D77CEB6883EF0FC1C515 --state 1 \
//!     --attributes device.json
//! cuco verify --config issuer.json --serial 8A1054AAC0A0D77CEB6883EF0FC1C515 ticket.txt
//! cuco decode-time 1d9093dd
//! cuco unlock-window <64 hex digest>
//! ```

mod config;
mod keystore;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use config::IssuerConfig;
use cuco_core::{DeviceKeys, RequestIntent, bytes::unlock_window_from_hex, timestamp};
use cuco_ticket::{Authenticator, DeviceAttributes, TicketFactory};
use keystore::KeyStore;
use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
    process::ExitCode,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cuco", author, version, about = "Issue and verify CUCo device tickets")]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace); overrides RUST_LOG.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Issue a signed ticket for a device.
    Issue {
        #[arg(short, long, env = "CUCO_CONFIG")]
        config: PathBuf,

        /// Device serial number as listed in the key store.
        #[arg(short, long)]
        serial: String,

        /// Ledger state code: 0 free, 1 normal, 2 blocked.
        #[arg(long)]
        state: String,

        /// Device attribute document (JSON, pair-list or flat).
        #[arg(short, long)]
        attributes: Option<PathBuf>,

        /// Device address, when the key store entry has none.
        #[arg(long)]
        address: Option<String>,

        /// Request's `t` parameter; `checkme` forces a start ticket.
        #[arg(short = 't', long = "query")]
        query: Option<String>,
    },

    /// Check a ticket's signature against the device key.
    Verify {
        #[arg(short, long, env = "CUCO_CONFIG")]
        config: PathBuf,

        #[arg(short, long)]
        serial: String,

        /// Ticket file; reads stdin when omitted.
        ticket: Option<PathBuf>,
    },

    /// Decode a CT/LD field to an ISO-8601 time.
    DecodeTime {
        /// Hex seconds since 2010-01-01; a leading `-` marks an earlier time.
        #[arg(allow_hyphen_values = true)]
        hex: String,
    },

    /// Cut the unlock window from a 64-character hex digest.
    UnlockWindow { digest: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Issue {
            config,
            serial,
            state,
            attributes,
            address,
            query,
        } => {
            let config = IssuerConfig::load(&config)?;
            let store = KeyStore::load(&config.key_store)?;
            let keys = device_keys(&store, &serial, address.as_deref())?;

            let attributes = match attributes {
                Some(path) => {
                    let raw = fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read attributes {}", path.display()))?;
                    DeviceAttributes::from_json_str(&raw)
                        .with_context(|| format!("Failed to parse attributes {}", path.display()))?
                }
                None => DeviceAttributes::new(),
            };

            let factory = TicketFactory::new(config.defaults);
            let intent = RequestIntent::from_query(query.as_deref());
            let wire = factory
                .issue(&state, &keys, &attributes, intent)
                .with_context(|| format!("Failed to issue ticket for {serial}"))?;

            info!(serial = %serial, state = %state, "ticket issued");
            println!("{wire}");
            Ok(ExitCode::SUCCESS)
        }

        Command::Verify {
            config,
            serial,
            ticket,
        } => {
            let config = IssuerConfig::load(&config)?;
            let store = KeyStore::load(&config.key_store)?;
            let keys = store
                .get(&serial)
                .with_context(|| format!("No keys for device {serial}"))?;

            let raw = read_ticket(ticket)?;
            let wire = raw.strip_suffix('\n').unwrap_or(&raw);
            let authenticator = Authenticator::for_device(keys)?;

            if authenticator.verify(wire)? {
                println!("valid");
                Ok(ExitCode::SUCCESS)
            } else {
                warn!(serial = %serial, "signature mismatch");
                println!("invalid");
                Ok(ExitCode::FAILURE)
            }
        }

        Command::DecodeTime { hex } => {
            println!("{}", timestamp::decode(&hex)?);
            Ok(ExitCode::SUCCESS)
        }

        Command::UnlockWindow { digest } => {
            let window = unlock_window_from_hex(&digest)?;
            println!("{} (offset {})", window.code(), window.offset());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Keys for `serial`, with the address filled in or overridden.
fn device_keys(store: &KeyStore, serial: &str, address: Option<&str>) -> Result<DeviceKeys> {
    let stored = store
        .get(serial)
        .with_context(|| format!("No keys for device {serial}"))?;

    let keys = match address {
        Some(address) => DeviceKeys::new(address, stored.ak(), stored.uk()),
        None if stored.address().is_empty() => {
            bail!("Key store has no address for {serial}; pass --address")
        }
        None => stored.clone(),
    };

    let derived = keys.serial_number()?;
    if !derived.as_str().eq_ignore_ascii_case(serial.trim()) {
        bail!("Address {} belongs to {derived}, not {serial}", keys.address());
    }
    Ok(keys)
}

fn read_ticket(path: Option<PathBuf>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("Failed to read ticket {}", path.display())),
        None => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read ticket from stdin")?;
            Ok(raw)
        }
    }
}
