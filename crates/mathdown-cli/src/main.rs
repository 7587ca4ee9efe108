//! mathdown CLI: render streamed Markdown+LaTeX chat output to HTML.
//!
//! One-shot mode reads the whole input and prints the final HTML. With
//! `--chunk-size` the input is replayed through the real streaming scheduler
//! instead, which is how the renderer behaves under a live token stream.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use mathdown_core::{KatexEngine, Renderer};
use mathdown_stream::{Config, RenderRouter, RenderUpdate, TurnId};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mathdown", version, about = "Render streamed Markdown+LaTeX chat output to HTML")]
struct Args {
    /// Input file; reads stdin when omitted.
    file: Option<PathBuf>,

    /// Replay the input through the streaming scheduler in chunks of this
    /// many bytes (UTF-8 boundaries respected).
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Delay between replayed chunks, in milliseconds.
    #[arg(long, default_value_t = 0, requires = "chunk_size")]
    delay_ms: u64,

    /// Emit every render pass as a JSON line instead of bare final HTML.
    #[arg(long)]
    json: bool,

    /// TOML config file (`debounce_ms`, `[macros]`).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e:#}"); // pretty anyhow chain
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let input = read_input(args.file.as_deref())?;
    tracing::debug!(bytes = input.len(), streaming = args.chunk_size.is_some(), "input loaded");
    let engine = KatexEngine::new(config.macros.clone())?;
    let renderer = Renderer::new(Arc::new(engine));

    match args.chunk_size {
        Some(chunk_size) => {
            let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
            runtime.block_on(replay(
                renderer,
                &config,
                &input,
                chunk_size.max(1),
                Duration::from_millis(args.delay_ms),
                args.json,
            ))
        }
        None => {
            let html = renderer.render(&input, true);
            emit(
                &RenderUpdate {
                    turn_id: TurnId::new(),
                    html,
                    is_final: true,
                },
                args.json,
            )
        }
    }
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            Ok(input)
        }
    }
}

/// Feeds the input through the streaming scheduler as a simulated token
/// stream and prints the resulting render passes.
async fn replay(
    renderer: Renderer,
    config: &Config,
    input: &str,
    chunk_size: usize,
    delay: Duration,
    json: bool,
) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut router = RenderRouter::new(renderer, config.stream(), tx);
    let turn = TurnId::new();

    let printer = tokio::spawn(async move {
        let mut result = Ok(());
        while let Some(update) = rx.recv().await {
            if json || update.is_final {
                if let Err(e) = emit(&update, json) {
                    result = Err(e);
                }
            }
        }
        result
    });

    for chunk in chunk_text(input, chunk_size) {
        router.on_chunk(turn, &chunk);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
    router.on_stream_end(turn);
    drop(router);

    printer.await.context("printer task failed")?
}

fn emit(update: &RenderUpdate, json: bool) -> Result<()> {
    if json {
        let line = serde_json::to_string(update).context("failed to encode update")?;
        println!("{line}");
    } else {
        println!("{}", update.html);
    }
    Ok(())
}

/// Splits text into chunks of at least `chunk_size` bytes on char boundaries.
fn chunk_text(input: &str, chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for c in input.chars() {
        current.push(c);
        if current.len() >= chunk_size {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
