use anyhow::Result;
use clap::{Parser, Subcommand};
use copysweep::app::Session;
use copysweep::config::{settings, AppConfig};
use copysweep::core::{ScanSnapshot, SystemTrash};
use copysweep::utils::format_bytes;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "copysweep", version, about = "Detect and safely recycle redundant copy files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a directory tree and report copy candidates
    Scan {
        root: PathBuf,
    },
    /// Move all safe-to-delete copies in a tree to the system trash
    Clean {
        root: PathBuf,
        /// Require a content-digest match with the original before deleting
        #[arg(long)]
        strict: bool,
        /// Actually delete; without this flag the approved set is only printed
        #[arg(long)]
        yes: bool,
    },
    /// Scan a tree, then keep watching it and re-report on every change
    Watch {
        root: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = AppConfig::load().unwrap_or_default();

    match cli.command {
        Command::Scan { root } => {
            let (mut session, _rx) = new_session(config);
            let snapshot = session.open_root(&root).await?;
            print_snapshot(snapshot);
            persist_last_directory(&session);
        }
        Command::Clean { root, strict, yes } => {
            config.strict_hash = config.strict_hash || strict;
            let (mut session, _rx) = new_session(config);
            let snapshot = session.open_root(&root).await?;
            let deletable: Vec<PathBuf> = snapshot
                .candidates
                .iter()
                .filter(|c| c.deletable)
                .map(|c| c.path.clone())
                .collect();

            if deletable.is_empty() {
                println!("No deletable copies found under {}", root.display());
            } else if !yes {
                println!(
                    "Would delete {} file(s) (re-run with --yes to proceed):",
                    deletable.len()
                );
                for path in &deletable {
                    println!("  {}", path.display());
                }
            } else {
                let report = session.delete_paths(&deletable).await?;
                println!("Moved {} file(s) to the trash.", report.deleted_count());
                for (path, reason) in &report.failed {
                    println!("  failed: {} ({})", path.display(), reason);
                }
            }
            persist_last_directory(&session);
        }
        Command::Watch { root } => {
            let (tx, mut rx) = mpsc::unbounded_channel::<ScanSnapshot>();
            let trasher = Arc::new(SystemTrash);
            let mut session = Session::new(config, tx, trasher);
            session.open_root(&root).await?;
            session.start_watch()?;
            persist_last_directory(&session);

            // The initial snapshot arrives through the channel as well.
            println!("Watching {} (Ctrl-C to stop)...", root.display());
            loop {
                tokio::select! {
                    maybe_snapshot = rx.recv() => {
                        match maybe_snapshot {
                            Some(snapshot) => print_snapshot(&snapshot),
                            None => break,
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        session.stop_watch();
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

type SnapshotReceiver = mpsc::UnboundedReceiver<ScanSnapshot>;

fn new_session(
    config: AppConfig,
) -> (Session<mpsc::UnboundedSender<ScanSnapshot>>, SnapshotReceiver) {
    // The one-shot commands read snapshots from session return values; the
    // receiver only has to stay alive so publishing stays quiet.
    let (tx, rx) = mpsc::unbounded_channel::<ScanSnapshot>();
    (Session::new(config, tx, Arc::new(SystemTrash)), rx)
}

fn persist_last_directory<S: copysweep::core::SnapshotSink>(session: &Session<S>) {
    if let Err(e) = settings::save_config(session.config()) {
        tracing::warn!("Failed to persist config: {}", e);
    }
}

fn print_snapshot(snapshot: &ScanSnapshot) {
    let deletable = snapshot.candidates.iter().filter(|c| c.deletable).count();
    println!(
        "{} copy candidate(s), {} deletable, potential save: {}",
        snapshot.candidates.len(),
        deletable,
        format_bytes(snapshot.reclaimable_bytes())
    );

    for candidate in &snapshot.candidates {
        let status = if candidate.deletable {
            "original found"
        } else {
            "original missing"
        };
        println!(
            "  {}  [{}]  {}",
            candidate.path.display(),
            status,
            format_bytes(candidate.size)
        );
    }

    let aggregates = snapshot.folder_aggregates();
    if !aggregates.is_empty() {
        println!("Per folder:");
        for aggregate in aggregates {
            println!(
                "  {}  {} file(s), {}",
                aggregate.directory.display(),
                aggregate.count,
                format_bytes(aggregate.reclaimable_bytes)
            );
        }
    }
}
