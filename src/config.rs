//! Configuration management for the campus tile server.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `CAMPUS_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use campus_tiles::config::{Cli, Command};
//!
//! match Cli::parse().into_command() {
//!     Command::Serve(config) => println!("Listening on {}", config.bind_address()),
//!     Command::Check(config) => println!("Checking {}", config.data_file.display()),
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `CAMPUS_HOST` - Server bind address (default: 0.0.0.0)
//! - `CAMPUS_PORT` - Server port (default: 8383)
//! - `CAMPUS_DATA_FILE` - Building dataset (default: static/maps/map.json)
//! - `CAMPUS_STATIC_ROOT` - Root that floor image references resolve against (default: static)
//! - `CAMPUS_TILES_DIR` - Rendered tile store (default: static/api/tiles)
//! - `CAMPUS_WORKERS` - Tile worker count (default: 4)
//! - `CAMPUS_CACHE_ZOOMED` - Zoomed floor cache budget (default: 256MiB)
//! - `CAMPUS_CACHE_TILES` - Tile cache budget (default: 256MiB)
//! - `CAMPUS_DEBUG` - Ignore stored tiles and re-render (default: false)
//! - `CAMPUS_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `CAMPUS_CORS_ORIGINS` - Allowed CORS origins, comma-separated

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::tile::{DEFAULT_TILE_CACHE_CAPACITY, DEFAULT_TILE_WORKERS, DEFAULT_ZOOMED_CACHE_CAPACITY};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8383;

/// Default building dataset location.
pub const DEFAULT_DATA_FILE: &str = "static/maps/map.json";

/// Default root for floor image references.
pub const DEFAULT_STATIC_ROOT: &str = "static";

/// Default rendered tile directory.
pub const DEFAULT_TILES_DIR: &str = "static/api/tiles";

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

/// Upper bound on tile workers.
pub const MAX_WORKERS: usize = 256;

// =============================================================================
// Byte Sizes
// =============================================================================

/// Parse a human-readable byte size: `1048576`, `512KB`, `100MB`, `256MiB`, `1GiB`.
///
/// Decimal (`KB`, `MB`, `GB`) and binary (`KiB`, `MiB`, `GiB`) suffixes are
/// accepted, case-insensitively.
pub fn parse_byte_size(input: &str) -> Result<usize, String> {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, suffix) = trimmed.split_at(split);

    if digits.is_empty() {
        return Err(format!("invalid size {:?}: expected a number", input));
    }
    let value: usize = digits
        .parse()
        .map_err(|e| format!("invalid size {:?}: {}", input, e))?;

    let multiplier: usize = match suffix.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" => 1_000,
        "m" | "mb" => 1_000_000,
        "g" | "gb" => 1_000_000_000,
        "kib" => 1 << 10,
        "mib" => 1 << 20,
        "gib" => 1 << 30,
        other => return Err(format!("invalid size {:?}: unknown unit {:?}", input, other)),
    };

    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("invalid size {:?}: too large", input))
}

fn format_mib(bytes: usize) -> String {
    format!("{}MiB", bytes / (1024 * 1024))
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// Campus Tiles - composites building floor plans into slippy-map tiles.
///
/// Runs the tile server when no subcommand is given.
#[derive(Parser, Debug, Clone)]
#[command(name = "campus-tiles")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub serve: ServeConfig,
}

impl Cli {
    /// The command to run; `serve` when none was given.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the tile server
    Serve(ServeConfig),

    /// Validate the building dataset and, optionally, every floor image
    Check(CheckConfig),
}

/// Arguments of the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "CAMPUS_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "CAMPUS_PORT")]
    pub port: u16,

    // =========================================================================
    // Data Configuration
    // =========================================================================
    /// Building dataset (JSON array of buildings).
    #[arg(long, default_value = DEFAULT_DATA_FILE, env = "CAMPUS_DATA_FILE")]
    pub data_file: PathBuf,

    /// Directory floor image references are resolved against.
    #[arg(long, default_value = DEFAULT_STATIC_ROOT, env = "CAMPUS_STATIC_ROOT")]
    pub static_root: PathBuf,

    /// Directory rendered tiles are persisted to.
    #[arg(long, default_value = DEFAULT_TILES_DIR, env = "CAMPUS_TILES_DIR")]
    pub tiles_dir: PathBuf,

    // =========================================================================
    // Tile Configuration
    // =========================================================================
    /// Number of tiles rendered concurrently.
    #[arg(long, default_value_t = DEFAULT_TILE_WORKERS, env = "CAMPUS_WORKERS")]
    pub workers: usize,

    /// Byte budget of the zoomed floor image cache (e.g. 256MiB).
    #[arg(
        long,
        default_value = "256MiB",
        value_parser = parse_byte_size,
        env = "CAMPUS_CACHE_ZOOMED"
    )]
    pub cache_zoomed: usize,

    /// Byte budget of the rendered tile cache (e.g. 256MiB).
    #[arg(
        long,
        default_value = "256MiB",
        value_parser = parse_byte_size,
        env = "CAMPUS_CACHE_TILES"
    )]
    pub cache_tiles: usize,

    /// Ignore tiles already on disk and render every cache miss.
    #[arg(long, default_value_t = false, env = "CAMPUS_DEBUG")]
    pub debug: bool,

    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "CAMPUS_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "CAMPUS_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            static_root: PathBuf::from(DEFAULT_STATIC_ROOT),
            tiles_dir: PathBuf::from(DEFAULT_TILES_DIR),
            workers: DEFAULT_TILE_WORKERS,
            cache_zoomed: DEFAULT_ZOOMED_CACHE_CAPACITY,
            cache_tiles: DEFAULT_TILE_CACHE_CAPACITY,
            debug: false,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            cors_origins: None,
            verbose: false,
            no_tracing: false,
        }
    }
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be greater than 0".to_string());
        }
        if self.workers > MAX_WORKERS {
            return Err(format!("workers must be at most {}", MAX_WORKERS));
        }

        if self.cache_zoomed == 0 {
            return Err("cache_zoomed must be greater than 0".to_string());
        }
        if self.cache_tiles == 0 {
            return Err("cache_tiles must be greater than 0".to_string());
        }

        if self.data_file.as_os_str().is_empty() {
            return Err("data file is required. Set --data-file or CAMPUS_DATA_FILE".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// One-line summary of the cache budgets.
    pub fn cache_summary(&self) -> String {
        format!(
            "{} zoomed floors, {} tiles",
            format_mib(self.cache_zoomed),
            format_mib(self.cache_tiles)
        )
    }
}

/// Arguments of the `check` command.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    /// Building dataset (JSON array of buildings).
    #[arg(long, default_value = DEFAULT_DATA_FILE, env = "CAMPUS_DATA_FILE")]
    pub data_file: PathBuf,

    /// Directory floor image references are resolved against.
    #[arg(long, default_value = DEFAULT_STATIC_ROOT, env = "CAMPUS_STATIC_ROOT")]
    pub static_root: PathBuf,

    /// Also load, decode and rotate every floor image.
    #[arg(long, default_value_t = false)]
    pub images: bool,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Tests
// =============================================================================
