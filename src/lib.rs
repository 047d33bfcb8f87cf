//! iht-launch: a multi-node launcher for distributed benchmark experiments.

// Command line arguments and configuration.
pub mod config;
// How to parse and represent cluster nodes.
pub mod node;
// Per-node experiment parameter flags.
pub mod flags;
// Remote command construction.
pub mod command;
// Parallel dispatch and result collection.
pub mod dispatch;
// Command execution.
pub mod session;
// Error handling.
pub mod error;

pub use command::{build_commands, Cmd, CommandSet};
pub use config::{validate_experiment_name, Config, Distribution, LogLevel, RunType, Structure};
pub use dispatch::{execute, FileMode};
pub use error::LaunchError;
pub use flags::{exp_flags, parse_bound, parse_op_distribution};
pub use node::{domain_name, get_nodes, Node};
pub use session::{Session, ShellSession};
