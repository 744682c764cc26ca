use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use hyprism_lib::core::downloader::{ProgressCallback, ProgressEvent, TransferRequest};
use hyprism_lib::core::error::LauncherResult;
use hyprism_lib::core::instance::InstanceId;
use hyprism_lib::core::state::AppState;

const PB_STYLE: &str =
    "{spinner:.blue} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} {msg}";

#[derive(Debug, Parser)]
#[command(name = "hyprism", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Cli {
    /// Launcher root directory (defaults to the platform data dir).
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the launcher folders and write the settings file.
    Init,
    /// Show the latest blog posts.
    News {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Manage game instances.
    #[command(subcommand)]
    Instances(InstanceCommands),
    /// Check the release channel for a newer launcher.
    CheckUpdate {
        #[arg(long, default_value = env!("CARGO_PKG_VERSION"))]
        current: String,
        /// Download the update here when one is available.
        #[arg(long)]
        install_to: Option<PathBuf>,
    },
    /// Fetch a file through the download engine.
    Download {
        url: String,
        dest: PathBuf,
        #[arg(long, default_value = "download")]
        stage: String,
    },
}

#[derive(Debug, Subcommand)]
enum InstanceCommands {
    #[command(alias = "ls")]
    List,
    Create { branch: String, version: u32 },
    #[command(alias = "rm")]
    Delete { name: String },
}

#[tokio::main]
async fn main() -> LauncherResult<()> {
    hyprism_lib::init_logging();

    let cli = Cli::parse();
    let state = match cli.root {
        Some(root) => AppState::with_root(root)?,
        None => AppState::new()?,
    };

    match cli.cmd {
        Commands::Init => {
            state.paths.create_folders().await?;
            state.save_settings()?;
            println!("Launcher ready at {}", state.paths.root().display());
            if !state.paths.is_version_installed().await {
                println!("No game build installed yet");
            }
        }
        Commands::News { limit } => {
            let limit = limit.unwrap_or(state.settings.news_limit);
            for item in state.news.get_news(limit).await? {
                println!("{}  {}\n    {}\n    {}", item.date, item.title, item.excerpt, item.url);
            }
        }
        Commands::Instances(cmd) => run_instances(&state, cmd).await?,
        Commands::CheckUpdate {
            current,
            install_to,
        } => match state.updater.check_update(&current).await? {
            None => println!("HyPrism {current} is up to date"),
            Some(update) => {
                println!("HyPrism {} is available", update.version);
                if let Some(dest) = install_to {
                    let bar = progress_bar();
                    let on_progress = bar_callback(bar.clone());
                    state
                        .updater
                        .download_update(&update, &dest, Some(on_progress))
                        .await?;
                    bar.finish_with_message("done");
                }
            }
        },
        Commands::Download { url, dest, stage } => {
            let bar = progress_bar();
            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_ctrl_c.cancel();
                }
            });

            let mut request = TransferRequest::new(&dest, url)
                .with_stage(stage)
                .with_cancellation(cancel);
            request.on_progress = Some(bar_callback(bar.clone()));

            let result = state.downloader.transfer(&request).await;
            match result {
                Ok(()) => bar.finish_with_message("done"),
                Err(e) => {
                    bar.abandon_with_message("failed");
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}

async fn run_instances(state: &AppState, cmd: InstanceCommands) -> LauncherResult<()> {
    match cmd {
        InstanceCommands::List => {
            for name in state.instances.list().await? {
                println!("{name}");
            }
        }
        InstanceCommands::Create { branch, version } => {
            let layout = state.instances.create(InstanceId::new(branch, version)).await?;
            println!("{}", layout.path.display());
        }
        InstanceCommands::Delete { name } => {
            let id = InstanceId::parse(&name)?;
            state.instances.delete(&id).await?;
        }
    }
    Ok(())
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::no_length();
    if let Ok(style) = ProgressStyle::with_template(PB_STYLE) {
        bar.set_style(style);
    }
    bar
}

fn bar_callback(bar: ProgressBar) -> ProgressCallback {
    Arc::new(move |event: &ProgressEvent| {
        if let Some(total) = event.total {
            bar.set_length(total);
        }
        bar.set_position(event.downloaded);
        bar.set_message(event.speed.clone());
    })
}
