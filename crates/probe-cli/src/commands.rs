//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use storefront_probe::config::DEFAULT_CONFIG_PATH;
use storefront_probe::data::DEFAULT_DATA_PATH;

/// storefront-probe: end-to-end checks for the Chitai-Gorod storefront
#[derive(Parser, Debug)]
#[command(name = "storefront-probe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Configuration file
    #[arg(long, env = "STOREFRONT_CONFIG", default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    /// Test data file (token, phone, username)
    #[arg(long, env = "STOREFRONT_DATA", default_value = DEFAULT_DATA_PATH, global = true)]
    pub data: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scenario suites
    Run(RunArgs),

    /// Call the cart API directly
    Cart(CartArgs),

    /// Print the id of a product from the top listing
    RandomId,

    /// Inspect configuration
    Config(ConfigArgs),
}

/// Suites selectable by `run`
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuiteTarget {
    /// Cart API suites
    Api,
    /// Browser suites
    Ui,
    /// API then browser
    All,
}

impl SuiteTarget {
    /// Whether the API suites run
    #[must_use]
    pub const fn includes_api(self) -> bool {
        matches!(self, Self::Api | Self::All)
    }

    /// Whether the browser suites run
    #[must_use]
    pub const fn includes_ui(self) -> bool {
        matches!(self, Self::Ui | Self::All)
    }
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Suites to run
    #[arg(value_enum)]
    pub target: SuiteTarget,

    /// Only run scenarios whose name contains this
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Stop a suite at its first failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Write a JSON report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Arguments for the cart command
#[derive(Parser, Debug)]
pub struct CartArgs {
    /// Cart operation
    #[command(subcommand)]
    pub action: CartAction,
}

/// Direct cart operations
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAction {
    /// Show the cart
    View,
    /// Empty the cart
    Clear,
    /// Add a product by catalog id
    Add {
        /// Product id
        product_id: u64,
    },
    /// Remove a cart line
    Remove {
        /// Cart line id
        line_id: u64,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Config operation
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config operations
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Load config and data files and print the resolved settings
    Check,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Detect terminal
    #[default]
    Auto,
    /// Always color
    Always,
    /// Never color
    Never,
}
