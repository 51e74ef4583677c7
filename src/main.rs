//! Wayfinder - Multi-Agent Transport Planner
//!
//! Main entry point: serves the chat page, or runs the terminal REPL.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wayfinder::core::ResponseMode;
use wayfinder::{cli, planner, web, ChatFrontEnd, Config, Repl};

/// Wayfinder - Multi-Agent Transport Planner
#[derive(Parser, Debug)]
#[command(name = "wayfinder")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the web server to
    #[arg(long)]
    host: Option<String>,

    /// Port for the web server
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// Gemini model used by every agent
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Show every step's answer instead of only the final report
    #[arg(long)]
    show_steps: bool,

    /// Open the chat page in a browser once the server is up
    #[arg(long)]
    open: bool,

    /// Use the terminal REPL instead of the web page
    #[arg(long)]
    repl: bool,

    /// Single prompt mode (non-interactive)
    #[arg(long)]
    prompt: Option<String>,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "wayfinder=debug,tower_http=debug"
    } else {
        "wayfinder=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    // .env may carry RUST_LOG, so it is read before the subscriber
    let _ = dotenvy::dotenv();
    init_tracing(args.debug);

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(model) = args.model {
        config.gemini.model = model;
    }
    if args.show_steps {
        config.agent.response_mode = ResponseMode::EachStep;
    }
    if args.open {
        config.server.open_browser = true;
    }

    if args.print_config {
        println!("# {}", Config::config_file().display());
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    if !config.has_api_key() {
        tracing::warn!("No Gemini API key configured. Set GOOGLE_API_KEY; requests will fail until then.");
    }

    let agent = planner::gemini_planner(&config)?;
    let front_end = ChatFrontEnd::from_config(&config, agent);

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        let mut repl = Repl::new(config, front_end)?;
        let replies = repl.ask(&prompt)?;
        cli::print_replies(&replies);
        return Ok(());
    }

    // Interactive REPL mode
    if args.repl {
        let mut repl = Repl::new(config, front_end)?;
        repl.run()?;
        return Ok(());
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(web::serve(&config, front_end))
}
