use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use client_core::{
    resolve_base_url, FilePreferenceStore, HttpTransport, LibraryController, RefreshOutcome,
    RequestController, RequestState, SubmitOutcome, ThemeController, Transport,
};
use futures::StreamExt;
use shared::{
    domain::{Length, PageLimit, Sentiment, SortKey, ThemeMode, Tone},
    protocol::GenerationRequest,
};
use tokio::sync::watch;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;

#[derive(Parser, Debug)]
#[command(name = "contentforge", about = "Generate content and browse the library")]
struct Cli {
    #[arg(long, default_value = "contentforge.toml")]
    config: PathBuf,
    /// Overrides the configured backend url.
    #[arg(long)]
    backend_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit one generation request and print its outputs.
    Generate {
        prompt: String,
        #[arg(long, default_value_t = Tone::default())]
        tone: Tone,
        #[arg(long, default_value_t = Sentiment::default())]
        sentiment: Sentiment,
        #[arg(long, default_value_t = Length::default())]
        length: Length,
        #[arg(long, default_value_t = 0.35)]
        creativity: f64,
        #[arg(long, default_value_t = 2)]
        variants: u8,
    },
    /// List recent generations, filtered and sorted locally.
    Library {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value_t = SortKey::default())]
        sort: SortKey,
    },
    /// Show or change the appearance preference.
    Theme {
        #[arg(long)]
        set: Option<ThemeMode>,
        /// Whether the system currently prefers a dark appearance.
        #[arg(long)]
        system_dark: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let cli = Cli::parse();

    let mut settings = config::load_settings(&cli.config)?;
    if let Some(backend_url) = cli.backend_url {
        settings.backend_url = Some(backend_url);
    }
    debug!(?settings, "loaded settings");

    match cli.command {
        Command::Generate {
            prompt,
            tone,
            sentiment,
            length,
            creativity,
            variants,
        } => {
            let request = GenerationRequest::new(prompt)
                .with_tone(tone)
                .with_sentiment(sentiment)
                .with_length(length)
                .with_creativity(creativity)
                .with_variants(variants);
            generate(transport(&settings)?, request).await
        }
        Command::Library {
            limit,
            search,
            sort,
        } => {
            let page_limit = match limit {
                Some(limit) => PageLimit::try_from(limit).map_err(|err| anyhow!(err))?,
                None => settings.page_limit,
            };
            library(transport(&settings)?, page_limit, &search, sort).await
        }
        Command::Theme { set, system_dark } => {
            theme(&settings, set, system_dark);
            Ok(())
        }
    }
}

fn transport(settings: &config::Settings) -> Result<Arc<dyn Transport>> {
    let base_url = resolve_base_url(settings.backend_url.as_deref(), &settings.origin);
    info!("using backend {base_url}");
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(base_url)?);
    Ok(transport)
}

async fn generate(transport: Arc<dyn Transport>, request: GenerationRequest) -> Result<()> {
    let controller = RequestController::new(transport);
    let mut changes = controller.changes();
    let progress = tokio::spawn(async move {
        while let Some(state) = changes.next().await {
            debug!(phase = ?state.phase(), "generate: state changed");
        }
    });

    let outcome = controller.submit(request).await;
    progress.abort();

    match (outcome, controller.snapshot()) {
        (SubmitOutcome::RejectedEmptyPrompt, _) => Err(anyhow!("prompt must not be empty")),
        (_, RequestState::Succeeded { outputs }) => {
            if outputs.is_empty() {
                println!("No outputs returned.");
            }
            for (index, output) in outputs.iter().enumerate() {
                println!("--- Variant {} ---\n{output}", index + 1);
            }
            Ok(())
        }
        (_, RequestState::Failed { message }) => Err(anyhow!(message)),
        (outcome, state) => Err(anyhow!(
            "generation did not complete (outcome={outcome:?}, phase={:?})",
            state.phase()
        )),
    }
}

async fn library(
    transport: Arc<dyn Transport>,
    page_limit: PageLimit,
    search: &str,
    sort: SortKey,
) -> Result<()> {
    let controller = LibraryController::with_page_limit(transport, page_limit);
    controller.set_search_text(search);
    controller.set_sort_key(sort);
    let outcome = controller.start().await;
    let state = controller.snapshot();

    if let Some(error) = &state.error {
        eprintln!("error: {error}");
    }
    for (index, item) in state.view.iter().enumerate() {
        println!("[{}] {}  {}", item.key(index), item.meta(), item.title());
    }
    if state.is_empty_result() {
        println!("No results. Try adjusting your search or sort.");
    }

    match outcome {
        RefreshOutcome::Failed => Err(anyhow!("library could not be loaded")),
        _ => Ok(()),
    }
}

fn theme(settings: &config::Settings, set: Option<ThemeMode>, system_dark: bool) {
    let store = Arc::new(FilePreferenceStore::new(&settings.preferences_path));
    let (_system, system_rx) = watch::channel(system_dark);
    let controller = ThemeController::new(store, system_rx);

    if let Some(mode) = set {
        if let Err(err) = controller.set_mode(mode) {
            eprintln!("warning: {err:#}");
        }
    }
    let state = controller.snapshot();
    println!(
        "theme={} appearance={}",
        state.mode,
        if state.dark { "dark" } else { "light" }
    );
}
