use std::path::Path;
use std::process::exit;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;

use iht_launch::command::build_commands;
use iht_launch::config::{validate_experiment_name, Config};
use iht_launch::dispatch::{execute, FileMode};
use iht_launch::node::get_nodes;
use iht_launch::session::{Session, ShellSession};

/// The remote checkouts mirror the local layout, so the remote build
/// directory shares its name with the directory two levels above us.
fn bin_dir() -> String {
    std::env::current_dir()
        .ok()
        .and_then(|dir| dir.ancestors().nth(2).map(Path::to_path_buf))
        .and_then(|dir| dir.file_name().map(|name| name.to_string_lossy().into_owned()))
        .unwrap_or_else(|| ".".to_string())
}

#[tokio::main]
async fn main() {
    let config = Config::parse();

    // Validate everything before touching the filesystem or any node.
    if let Err(e) = validate_experiment_name(&config.experiment_name) {
        eprintln!("{}", e);
        exit(1);
    }
    let nodes = match get_nodes(&config.nodefile) {
        Ok(nodes) => nodes,
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    };

    let bin_dir = bin_dir();
    if config.verbose {
        eprintln!("Launching in bin_dir: {}", bin_dir);
    }

    let commands = match build_commands(&config, &nodes, &bin_dir) {
        Ok(commands) => commands,
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    };

    println!("{}", "Starting Experiment".green());

    let root = Path::new(config.results_root());
    let exp_dir = root.join(&config.experiment_name);
    let stats_dir = root.join(format!("{}-stats", config.experiment_name));
    if !config.dry_run {
        if let Err(e) =
            std::fs::create_dir_all(&exp_dir).and_then(|_| std::fs::create_dir_all(&stats_dir))
        {
            eprintln!("Failed to create results directories: {}", e);
            exit(1);
        }
    }

    let session: Arc<dyn Session + Send + Sync> = Arc::new(ShellSession);

    // Launch phase. Blocks until every node has finished (or failed), so
    // the result files exist remotely before the collection phase starts.
    execute(
        commands.launch,
        &exp_dir,
        FileMode::Truncate,
        config.dry_run,
        Arc::clone(&session),
    )
    .await;

    // Collection phase. Empty for correctness tests.
    execute(
        commands.collect,
        &stats_dir,
        FileMode::Append,
        config.dry_run,
        session,
    )
    .await;

    println!("{}", "Finished Experiment".green());
}
