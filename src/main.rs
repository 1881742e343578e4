//! Operator CLI for the catalog console
//!
//! `list` runs one query through the orchestrator and prints the page;
//! `import` uploads a CSV and follows the job until it settles.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use catalog_console_lib::application::{
    ImportWorkflow, ProgressSynchronizer, QueryError, QueryOrchestrator, SyncOutcome, ViewMessage, ViewState,
};
use catalog_console_lib::domain::{FilterState, PageLink, SearchType};
use catalog_console_lib::infrastructure::logging::init_logging_with_config;
use catalog_console_lib::infrastructure::{ConsoleConfig, HttpCatalogApi};

#[derive(Parser, Debug)]
#[command(author, version, about = "Catalog Console - product list and CSV import from the terminal")]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides `api.base_url`
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Lists one page of products
    List {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        search_type: Option<SearchType>,
        /// Only active (true) or inactive (false) products
        #[arg(long)]
        active: Option<bool>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Imports a CSV file and follows its progress
    Import { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConsoleConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
        config.validate().context("Invalid --base-url")?;
    }
    init_logging_with_config(&config.logging)?;

    let api = Arc::new(HttpCatalogApi::new(&config.api).context("Failed to build HTTP client")?);
    let orchestrator = QueryOrchestrator::new(api.clone(), &config.query);

    match cli.cmd {
        Commands::List { search, search_type, active, page } => {
            let filter = FilterState {
                search_term: search,
                search_type,
                status_filter: active,
                page: 1,
            };
            let mut outcome = orchestrator.apply_filters(filter).await;
            if page > 1 && outcome.is_ok() {
                outcome = orchestrator.go_to_page(page).await;
            }
            match outcome {
                Ok(_) | Err(QueryError::SearchTooShort { .. }) => print_view(&orchestrator.view().await),
                Err(e) => return Err(e).context("Failed to load products"),
            }
        }
        Commands::Import { file } => {
            let progress = ProgressSynchronizer::new(orchestrator.clone(), api.clone(), config.progress.clone());
            let workflow = ImportWorkflow::new(api, progress);
            let handle = workflow
                .start_file(&file)
                .await
                .with_context(|| format!("Failed to start import of {}", file.display()))?;
            info!("Following import job {}", handle.job_id());

            let mut status = handle.subscribe();
            loop {
                tokio::select! {
                    changed = status.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let snapshot = status.borrow_and_update().clone();
                        println!(
                            "[{:>3}%] {:?} {}",
                            snapshot.job.progress_percent,
                            snapshot.job.status,
                            snapshot.message.unwrap_or_default()
                        );
                    }
                    _ = tokio::signal::ctrl_c() => {
                        handle.stop();
                        break;
                    }
                }
            }

            match handle.join().await {
                SyncOutcome::Completed => println!("Import complete"),
                SyncOutcome::Failed(message) => {
                    anyhow::bail!("Import failed: {}", message.unwrap_or_else(|| "unknown error".into()))
                }
                SyncOutcome::StreamLost(reason) => return Err(QueryError::StreamLost(reason).into()),
                SyncOutcome::Stopped => println!("Stopped following the import; it keeps running on the server"),
            }
        }
    }

    Ok(())
}

fn print_view(view: &ViewState) {
    match &view.message {
        Some(ViewMessage::Guidance(text) | ViewMessage::Empty(text) | ViewMessage::Error(text)) => println!("{text}"),
        None => {}
    }
    for product in &view.rows {
        let status = if product.active { "active" } else { "inactive" };
        println!("{:>8}  {:<20}  {:<8}  {}", product.id, product.sku, status, product.name);
    }
    if let Some(window) = &view.page_window {
        let links: Vec<String> = window
            .links
            .iter()
            .map(|link| match *link {
                PageLink::Page(page) if window.is_current(*link) => format!("[{page}]"),
                PageLink::Page(page) => page.to_string(),
                PageLink::Ellipsis => "…".to_string(),
            })
            .collect();
        println!("Pages: {}", links.join(" "));
    } else if view.has_next_page() {
        println!("More results available (page {})", view.current_page + 1);
    }
}
