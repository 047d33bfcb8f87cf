//! Per-node experiment parameter flags.
//!
//! Derives the flag string appended to a node's remote command, either from
//! a JSON param config file or from the command line arguments themselves.
//! Each known parameter sits in an explicit flag table; adding a parameter
//! means adding a table row.

use std::fs::File;

use serde::Deserialize;

use crate::config::Config;
use crate::error::LaunchError;

/// Parameter override file. Field names double as the remote flag names.
#[derive(Debug, Deserialize)]
pub struct ParamConfig {
    runtime: u64,
    op_count: u64,
    contains: u32,
    insert: u32,
    remove: u32,
    key_lb: f64,
    key_ub: f64,
    region_size: u32,
    thread_count: u32,
    node_count: u32,
    qp_per_conn: u32,
    cache_depth: u32,
    distribution: String,
    unlimited_stream: bool,
}

impl ParamConfig {
    /// Flag table in the order the remote binary documents its options.
    fn flag_table(&self) -> Vec<(&'static str, String)> {
        vec![
            ("runtime", self.runtime.to_string()),
            ("op_count", self.op_count.to_string()),
            ("contains", self.contains.to_string()),
            ("insert", self.insert.to_string()),
            ("remove", self.remove.to_string()),
            ("key_lb", format_bound(self.key_lb)),
            ("key_ub", format_bound(self.key_ub)),
            ("region_size", self.region_size.to_string()),
            ("thread_count", self.thread_count.to_string()),
            ("node_count", self.node_count.to_string()),
            ("qp_per_conn", self.qp_per_conn.to_string()),
            ("cache_depth", self.cache_depth.to_string()),
            ("distribution", self.distribution.to_lowercase()),
        ]
    }
}

fn cli_flag_table(config: &Config) -> Vec<(&'static str, String)> {
    vec![
        ("runtime", config.runtime.to_string()),
        ("op_count", config.op_count.to_string()),
        ("region_size", config.region_size.to_string()),
        ("thread_count", config.thread_count.to_string()),
        ("node_count", config.node_count.to_string()),
        ("qp_per_conn", config.qp_per_conn.to_string()),
        ("cache_depth", config.cache_depth.to_string()),
        ("structure", config.structure.as_str().to_string()),
        ("distribution", config.distribution.as_str().to_string()),
    ]
}

/// Returns the flag string to append to the payload for one node.
///
/// Deterministic and side-effect free, apart from reading the param config
/// file when one was given. Every validation failure here happens before a
/// single command is dispatched.
pub fn exp_flags(config: &Config, node_id: u32) -> Result<String, LaunchError> {
    let mut params = format!(" --node_id {}", node_id);
    match &config.from_param_config {
        Some(path) => {
            let file = File::open(path).map_err(|source| LaunchError::FileRead {
                path: path.clone(),
                source,
            })?;
            let param_config: ParamConfig = serde_json::from_reader(file)?;
            for (flag, value) in param_config.flag_table() {
                params.push_str(&format!(" --{} {}", flag, value));
            }
            if param_config.unlimited_stream {
                params.push_str(" --unlimited_stream");
            }
            // The structure comes from the run configuration, not the file.
            params.push_str(&format!(" --structure {}", config.structure.as_str()));
        }
        None => {
            for (flag, value) in cli_flag_table(config) {
                params.push_str(&format!(" --{} {}", flag, value));
            }
            if config.unlimited_stream {
                params.push_str(" --unlimited_stream");
            }
            let (contains, insert, remove) = parse_op_distribution(&config.op_distribution)?;
            params.push_str(&format!(" --contains {}", contains));
            params.push_str(&format!(" --insert {}", insert));
            params.push_str(&format!(" --remove {}", remove));
            params.push_str(&format!(" --key_lb {}", parse_bound(&config.lb)?));
            params.push_str(&format!(" --key_ub {}", parse_bound(&config.ub)?));
        }
    }
    Ok(params)
}

/// Parses a `"contains-insert-remove"` percentage triple. The three parts
/// must be integers summing to exactly 100.
pub fn parse_op_distribution(op_distribution: &str) -> Result<(u32, u32, u32), LaunchError> {
    let bad = || LaunchError::BadOpDistribution(op_distribution.to_string());
    let parts: Vec<&str> = op_distribution.split('-').collect();
    let &[contains, insert, remove] = parts.as_slice() else {
        return Err(bad());
    };
    let contains: u32 = contains.trim().parse().map_err(|_| bad())?;
    let insert: u32 = insert.trim().parse().map_err(|_| bad())?;
    let remove: u32 = remove.trim().parse().map_err(|_| bad())?;
    // Sum in u64 so huge percentages can't wrap around to 100.
    if u64::from(contains) + u64::from(insert) + u64::from(remove) != 100 {
        return Err(bad());
    }
    Ok((contains, insert, remove))
}

/// Parses a key bound given as a numeric literal, with e-notation allowed
/// (`1e5` means 100000). Strictly a literal; anything else fails closed.
pub fn parse_bound(bound: &str) -> Result<String, LaunchError> {
    let value: f64 = bound
        .trim()
        .parse()
        .map_err(|_| LaunchError::BadKeyBound(bound.to_string()))?;
    if !value.is_finite() {
        return Err(LaunchError::BadKeyBound(bound.to_string()));
    }
    Ok(format_bound(value))
}

/// Integral bounds print without a decimal point so the remote binary sees
/// `100000`, not `100000.0`.
fn format_bound(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;
    use tempfile::NamedTempFile;

    use super::*;

    fn config(extra: &[&str]) -> Config {
        let defaults = [
            "--ssh_user=esl",
            "--experiment_name=exp",
            "--runtype=bench",
            "--structure=iht",
        ];
        let mut args = vec!["iht-launch"];
        for default in defaults {
            let key = default.split('=').next().unwrap();
            // Skip a default when the test overrides the same flag; clap
            // rejects duplicate occurrences.
            if !extra.iter().any(|e| e.split('=').next().unwrap() == key) {
                args.push(default);
            }
        }
        args.extend_from_slice(extra);
        Config::parse_from(args)
    }

    #[test]
    fn test_op_distribution_must_sum_to_100() {
        assert_eq!(parse_op_distribution("80-10-10").unwrap(), (80, 10, 10));
        assert_eq!(parse_op_distribution("100-0-0").unwrap(), (100, 0, 0));
        assert!(parse_op_distribution("70-10-10").is_err());
        assert!(parse_op_distribution("80-10").is_err());
        assert!(parse_op_distribution("80-10-10-0").is_err());
        assert!(parse_op_distribution("a-b-c").is_err());
    }

    #[test]
    fn test_op_distribution_sum_does_not_wrap() {
        // 4294967294 + 102 wraps to 100 in u32; the triple must still be
        // rejected, without panicking.
        assert!(parse_op_distribution("4294967294-102-0").is_err());
        assert!(parse_op_distribution("4294967295-101-0").is_err());
        assert!(parse_op_distribution("0-4294967295-101").is_err());
    }

    #[test]
    fn test_parse_bound_e_notation() {
        assert_eq!(parse_bound("1e5").unwrap(), "100000");
        assert_eq!(parse_bound("0").unwrap(), "0");
        assert_eq!(parse_bound("2.5e1").unwrap(), "25");
        assert_eq!(parse_bound("0.5").unwrap(), "0.5");
    }

    #[test]
    fn test_parse_bound_rejects_non_literals() {
        assert!(parse_bound("10**5").is_err());
        assert!(parse_bound("__import__('os')").is_err());
        assert!(parse_bound("nan").is_err());
        assert!(parse_bound("inf").is_err());
        assert!(parse_bound("").is_err());
    }

    #[test]
    fn test_cli_mode_flags() {
        let config = config(&["--op_distribution=70-20-10", "--ub=1e5", "--thread_count=4"]);
        let flags = exp_flags(&config, 2).unwrap();
        assert!(flags.starts_with(" --node_id 2"));
        assert!(flags.contains(" --runtime 10"));
        assert!(flags.contains(" --thread_count 4"));
        assert!(flags.contains(" --structure iht"));
        assert!(flags.contains(" --distribution uniform"));
        assert!(flags.contains(" --contains 70"));
        assert!(flags.contains(" --insert 20"));
        assert!(flags.contains(" --remove 10"));
        assert!(flags.contains(" --key_lb 0"));
        assert!(flags.contains(" --key_ub 100000"));
        assert!(!flags.contains("--unlimited_stream"));
    }

    #[test]
    fn test_cli_mode_unlimited_stream() {
        let config = config(&["--unlimited_stream"]);
        let flags = exp_flags(&config, 0).unwrap();
        assert!(flags.contains(" --unlimited_stream"));
    }

    #[test]
    fn test_cli_mode_bad_distribution_aborts() {
        let config = config(&["--op_distribution=50-10-10"]);
        assert!(matches!(
            exp_flags(&config, 0),
            Err(LaunchError::BadOpDistribution(_))
        ));
    }

    #[test]
    fn test_param_config_mode() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"{
                "runtime": 30, "op_count": 5000,
                "contains": 80, "insert": 10, "remove": 10,
                "key_lb": 0, "key_ub": 1e5,
                "region_size": 25, "thread_count": 8, "node_count": 2,
                "qp_per_conn": 30, "cache_depth": 3,
                "distribution": "UNIFORM", "unlimited_stream": true
            }"#,
        )
        .unwrap();
        let config = config(&[
            "--structure=btree",
            &format!("--from_param_config={}", file.path().display()),
        ]);
        let flags = exp_flags(&config, 1).unwrap();
        assert!(flags.starts_with(" --node_id 1"));
        assert!(flags.contains(" --runtime 30"));
        assert!(flags.contains(" --key_ub 100000"));
        // Enum-ish values are normalized to lowercase.
        assert!(flags.contains(" --distribution uniform"));
        assert!(flags.contains(" --unlimited_stream"));
        // Structure comes from the run configuration, not the file.
        assert!(flags.contains(" --structure btree"));
    }

    #[test]
    fn test_missing_param_config_names_the_path() {
        let config = config(&["--from_param_config=no_such_config.json"]);
        let err = exp_flags(&config, 0).unwrap_err();
        assert!(matches!(err, LaunchError::FileRead { ref path, .. } if path == "no_such_config.json"));
        assert!(err.to_string().contains("no_such_config.json"));
    }

    #[test]
    fn test_param_config_mode_bad_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json }").unwrap();
        let config = config(&[&format!("--from_param_config={}", file.path().display())]);
        assert!(matches!(
            exp_flags(&config, 0),
            Err(LaunchError::BadParamConfig(_))
        ));
    }
}
