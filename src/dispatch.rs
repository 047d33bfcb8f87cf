//! Parallel dispatch and result collection.
//!
//! `execute` runs one batch of commands, one OS process per command in its
//! own tokio task, each redirected to its own log file. It returns only
//! after every task has finished, which is what makes back-to-back calls a
//! barrier: the collection batch cannot start before every launch command
//! has come back, so the result files exist remotely before scp runs.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;
use colourado::{ColorPalette, PaletteType};
use futures::future::join_all;
use itertools::zip;

use crate::command::Cmd;
use crate::session::Session;

/// How to open a command's log file. Launch logs are fresh per run;
/// collection logs append next to the artifacts they describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    Truncate,
    Append,
}

fn open_log(path: &Path, mode: FileMode) -> io::Result<File> {
    match mode {
        FileMode::Truncate => File::create(path),
        FileMode::Append => OpenOptions::new().create(true).append(true).open(path),
    }
}

/// Executes every command in the batch concurrently and waits for all of
/// them. A command failing, or its log file failing to open, is reported
/// under its label and never touches its siblings.
///
/// In dry-run mode nothing is spawned and nothing is written; the command
/// text is printed instead, uniformly for the whole batch.
pub async fn execute(
    commands: Vec<Cmd>,
    out_dir: &Path,
    mode: FileMode,
    dry_run: bool,
    session: Arc<dyn Session + Send + Sync>,
) {
    if dry_run {
        for cmd in &commands {
            println!("{}", cmd.text);
        }
        return;
    }
    if commands.is_empty() {
        return;
    }

    let colors = ColorPalette::new(commands.len() as u32, PaletteType::Pastel, false).colors;
    let mut tasks = Vec::with_capacity(commands.len());
    for (color, cmd) in zip(colors, commands) {
        let session = Arc::clone(&session);
        let log_path: PathBuf = out_dir.join(format!("{}.txt", cmd.label));
        tasks.push(tokio::spawn(async move {
            let colorlabel = cmd.prettify(color);
            let log = match open_log(&log_path, mode) {
                Ok(log) => log,
                Err(e) => {
                    eprintln!(
                        "{} Failed to open log file {}: {}",
                        colorlabel,
                        log_path.display(),
                        e
                    );
                    return;
                }
            };
            match session.run(&cmd.text, log).await {
                Ok(status) if status.success() => {
                    println!("{} {}", colorlabel, "Successful Startup".green());
                }
                Ok(status) => {
                    println!(
                        "{} {} ({})",
                        colorlabel,
                        "Invalid Startup".red(),
                        status
                    );
                }
                Err(e) => {
                    println!("{} {} ({})", colorlabel, "Invalid Startup".red(), e);
                }
            }
        }));
    }

    // The join barrier. Nothing after this line can overlap the batch.
    join_all(tasks).await;
}
