//! Remote command construction.
//!
//! Per node, composes the launch command (remote build + run payload behind
//! an ssh prefix) and, for benchmark run types, the scp command that pulls
//! the result file back.

use colored::ColoredString;
use colourado::Color;

use crate::config::{Config, LogLevel, RunType};
use crate::error::LaunchError;
use crate::flags::exp_flags;
use crate::node::Node;

/// The build target that produces every benchmark binary.
const BUILD_TARGET: &str = "iht_rome_cached";

/// Stale binaries removed before rebuilding, unless --rerun keeps them.
const CLEAN_CMD: &str =
    "rm -f iht_rome && rm -f iht_rome_test && rm -f iht_twosided && rm -f iht_rome_cached && ";

/// An opaque shell command plus the label naming its output file.
/// Built once per node per phase, executed at most once, never retried.
#[derive(Debug, Clone)]
pub struct Cmd {
    pub text: String,
    pub label: String,
}

impl Cmd {
    /// For pretty-printing the label.
    /// Surrounds with brackets and colors it with a random color.
    pub fn prettify(&self, color: Color) -> ColoredString {
        use colored::Colorize;
        let r = (color.red * 256.0) as u8;
        let g = (color.green * 256.0) as u8;
        let b = (color.blue * 256.0) as u8;
        format!("[{}]", self.label).truecolor(r, g, b)
    }
}

/// Both phases of an experiment. `collect` is empty for correctness tests.
#[derive(Debug)]
pub struct CommandSet {
    pub launch: Vec<Cmd>,
    pub collect: Vec<Cmd>,
}

fn cmake_flags(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Info => "-DCMAKE_BUILD_TYPE=Release -DLOG_LEVEL=INFO",
        LogLevel::Debug => "-DCMAKE_BUILD_TYPE=Debug -DLOG_LEVEL=DEBUG",
        LogLevel::Trace => "-DCMAKE_BUILD_TYPE=Debug -DLOG_LEVEL=TRACE",
    }
}

/// Builds the launch and collect command batches for a run.
///
/// Correctness tests only get a launch command for the first node in the
/// node list. Benchmark runs get a launch and a collect command per node.
pub fn build_commands(
    config: &Config,
    nodes: &[Node],
    bin_dir: &str,
) -> Result<CommandSet, LaunchError> {
    let mut launch = Vec::with_capacity(nodes.len());
    let mut collect = Vec::new();

    for node in nodes {
        let ssh_target = node.ssh_target(&config.ssh_user);
        let del_cmd = if config.rerun { "" } else { CLEAN_CMD };
        let mut payload = format!(
            "cd {} && cmake {} . && {}make {} && LD_LIBRARY_PATH=.:./protos ./iht/",
            bin_dir,
            cmake_flags(config.level),
            del_cmd,
            BUILD_TARGET,
        );
        match config.runtype {
            RunType::Test => payload.push_str("iht_rome_test --send_test"),
            RunType::ConcurrentTest => payload.push_str("iht_rome_test --send_bulk"),
            RunType::Bench => {
                payload.push_str("iht_rome");
                payload.push_str(&exp_flags(config, node.id)?);
            }
            RunType::Twosided => {
                payload.push_str("iht_twosided");
                payload.push_str(&exp_flags(config, node.id)?);
            }
            RunType::Cached => {
                payload.push_str("iht_rome_cached");
                payload.push_str(&exp_flags(config, node.id)?);
            }
        }
        if config.verbose {
            payload.push_str(" -v");
        }
        // The whole payload rides as a single quoted argument to ssh.
        launch.push(Cmd {
            text: format!("ssh {} '{}'", ssh_target, payload),
            label: node.name.clone(),
        });

        if !config.runtype.is_bench() {
            // Correctness tests only run on the first node.
            break;
        }

        let result_file = config.structure.result_file();
        let remote_path = format!("/users/{}/{}/{}", config.ssh_user, bin_dir, result_file);
        let local_path = format!(
            "./{}/{}-stats/{}-{}",
            config.results_root(),
            config.experiment_name,
            node.name,
            result_file,
        );
        collect.push(Cmd {
            text: format!("scp {}:{} {}", ssh_target, remote_path, local_path),
            label: node.name.clone(),
        });
    }

    Ok(CommandSet { launch, collect })
}
