//! Configuration for the launcher.
//!
//! All command line arguments live here, parsed once by clap into an
//! immutable `Config` that is passed by reference into every component.

use clap::{Parser, ValueEnum};

use crate::error::LaunchError;

#[derive(Parser)]
#[command(
    version,
    about = "Launch a distributed benchmark experiment over SSH",
    rename_all = "snake_case"
)]
pub struct Config {
    /// Username for remote login
    #[arg(long, short = 'u')]
    pub ssh_user: String,

    /// Experiment name; used as the local save directory
    #[arg(long, short = 'e')]
    pub experiment_name: String,

    /// Path to the csv with the node names
    #[arg(long, default_value = "cloudlab.csv")]
    pub nodefile: String,

    /// Print the commands instead of running them
    #[arg(long)]
    pub dry_run: bool,

    /// Don't remove the remote binaries; reuse the previous build
    #[arg(long)]
    pub rerun: bool,

    /// Verbose output from the remote binary
    #[arg(long, short)]
    pub verbose: bool,

    /// Save results to a separate dev folder instead of results
    #[arg(long)]
    pub devmode: bool,

    /// The type of experiment to run
    #[arg(long, value_enum)]
    pub runtype: RunType,

    /// The level of print-out in the remote program
    #[arg(long, value_enum, default_value_t = LogLevel::Debug)]
    pub level: LogLevel,

    /// Override the experiment parameters with a JSON config file
    #[arg(long)]
    pub from_param_config: Option<String>,

    /// How long to run the experiment before cutting off
    #[arg(long, default_value_t = 10)]
    pub runtime: u64,

    /// Run the operation stream forever instead of until op_count runs out
    #[arg(long)]
    pub unlimited_stream: bool,

    /// The distribution of operations as contains-insert-remove. Must add up to 100
    #[arg(long, default_value = "80-10-10")]
    pub op_distribution: String,

    /// The number of operations to run when the stream is not unlimited
    #[arg(long, default_value_t = 10000)]
    pub op_count: u64,

    /// Lower bound of the key range. Can use e-notation as well
    #[arg(long, default_value = "0")]
    pub lb: String,

    /// Upper bound of the key range. Can use e-notation as well
    #[arg(long, default_value = "1e5")]
    pub ub: String,

    /// The key access distribution
    #[arg(long, value_enum, default_value_t = Distribution::Uniform)]
    pub distribution: Distribution,

    /// 2 ^ x bytes to allocate on each node
    #[arg(long, default_value_t = 25)]
    pub region_size: u32,

    /// The number of threads to start per client
    #[arg(long, default_value_t = 1)]
    pub thread_count: u32,

    /// The number of nodes to use in the experiment
    #[arg(long, default_value_t = 1)]
    pub node_count: u32,

    /// The number of queue pairs to use per connection at most
    #[arg(long, default_value_t = 30)]
    pub qp_per_conn: u32,

    /// The depth of which to cache layers in the IHT
    #[arg(long, default_value_t = 0)]
    pub cache_depth: u32,

    /// The data structure under test
    #[arg(long, value_enum)]
    pub structure: Structure,
}

impl Config {
    /// Root directory for launch logs and collected artifacts.
    pub fn results_root(&self) -> &'static str {
        if self.devmode {
            "dev"
        } else {
            "results"
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, ValueEnum)]
pub enum RunType {
    /// Single-threaded correctness test on the first node
    Test,
    /// Multi-threaded correctness test on the first node
    #[value(name = "concurrent_test")]
    ConcurrentTest,
    /// One-sided benchmark on every node
    Bench,
    /// Two-sided benchmark on every node
    Twosided,
    /// Cached benchmark on every node
    Cached,
}

impl RunType {
    /// Benchmark run types launch on every node and produce a result
    /// artifact to collect. Correctness tests do neither.
    pub fn is_bench(&self) -> bool {
        matches!(self, Self::Bench | Self::Twosided | Self::Cached)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Info,
    Debug,
    Trace,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, ValueEnum)]
pub enum Structure {
    Iht,
    Btree,
    Skiplist,
    #[value(name = "iht_tmp")]
    IhtTmp,
    Sherman,
    Multi,
    #[value(name = "iht_tuned")]
    IhtTuned,
}

impl Structure {
    /// The flag token passed to the remote binary.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iht => "iht",
            Self::Btree => "btree",
            Self::Skiplist => "skiplist",
            Self::IhtTmp => "iht_tmp",
            Self::Sherman => "sherman",
            Self::Multi => "multi",
            Self::IhtTuned => "iht_tuned",
        }
    }

    /// The result file the remote benchmark writes for this structure.
    pub fn result_file(&self) -> &'static str {
        match self {
            Self::Iht => "iht_result.csv",
            Self::Btree => "btree_result.csv",
            Self::Skiplist => "skiplist_result.csv",
            Self::IhtTmp => "iht_result_tmp.csv",
            Self::Sherman => "sherman_result.csv",
            Self::Multi => "multi_result.csv",
            Self::IhtTuned => "iht_tuned_result.csv",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, ValueEnum)]
pub enum Distribution {
    Uniform,
    Skew90,
    Skew95,
    Skew99,
}

impl Distribution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::Skew90 => "skew90",
            Self::Skew95 => "skew95",
            Self::Skew99 => "skew99",
        }
    }
}

/// Experiment names become directory names, so only letters, digits, and
/// underscores are allowed. Checked before any directory is created.
pub fn validate_experiment_name(name: &str) -> Result<(), LaunchError> {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(LaunchError::InvalidExperimentName(name.to_string()))
    }
}
