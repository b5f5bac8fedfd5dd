// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (RUST_LOG controls verbosity, output goes to stderr)
// 2. Parse command-line arguments using clap
// 3. Dispatch to the crawl or serve handler
// 4. Exit with proper code (0 = success, 2 = error)
// =============================================================================

mod cli; // src/cli.rs - command-line parsing

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands, CrawlArgs};
use site_scout::transport::sse;
use site_scout::{CrawlEvent, CrawlSession, Crawler};

#[tokio::main]
async fn main() {
    init_tracing();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl { website_url, json, options } => {
            handle_crawl(&website_url, json, &options).await
        }
        Commands::Serve { addr, options } => handle_serve(addr, &options).await,
    }
}

// Handles the 'crawl' subcommand
//
// Returns:
//   Ok(0) = crawl completed
//   Ok(2) = the crawl reported an Error event
async fn handle_crawl(website_url: &str, json: bool, options: &CrawlArgs) -> Result<i32> {
    let crawler = Crawler::new(options.to_config()).context("failed to build HTTP client")?;

    if !json {
        println!("🔍 Crawling website: {}", website_url);
        println!("📊 Max depth: {}, max URLs: {}", options.max_depth, options.max_urls);
    }

    let session = CrawlSession::start(crawler, website_url);
    let outcome = session
        .collect_with(|event| {
            if json {
                println!("{}", event.as_json());
            } else {
                print_event(event);
            }
        })
        .await;

    match outcome {
        Ok(urls) => {
            if !json {
                println!("\n📄 Discovered {} URL(s):", urls.len());
                for url in &urls {
                    println!("   {}", url);
                }
            }
            Ok(0)
        }
        // The Error event itself was already printed above
        Err(e) => {
            tracing::debug!(error = %e, "crawl did not complete");
            Ok(2)
        }
    }
}

// Handles the 'serve' subcommand
async fn handle_serve(addr: std::net::SocketAddr, options: &CrawlArgs) -> Result<i32> {
    let app = sse::router(options.to_config());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, "listening for crawl requests on POST /crawl-website");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(0)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
    }
    tracing::info!("shutting down");
}

// Prints one event in human-readable form
fn print_event(event: &CrawlEvent) {
    match event {
        CrawlEvent::Log { message } => println!("   {}", message),
        CrawlEvent::Progress { discovered, visited, queued, eta } => println!(
            "📊 {} discovered, {} visited, {} queued (~{}s left)",
            discovered, visited, queued, eta
        ),
        CrawlEvent::Error { message } => eprintln!("❌ {}", message),
        // Snapshots repeat the whole list; the summary prints it once at the end
        CrawlEvent::Urls { .. } => {}
    }
}
