use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use futures::StreamExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use augur_agent::Pipeline;
use augur_core::config::AppConfig;
use augur_core::types::StreamEvent;

#[derive(Parser)]
#[command(name = "augur", version, about = "Chinese classics and divination agent")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "augur.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve,
    /// Ask one question and stream the answer
    Ask {
        /// The question (read from stdin when empty)
        #[arg(trailing_var_arg = true)]
        question: Vec<String>,
    },
    /// Run a divination tool directly
    Tool {
        /// Tool name, e.g. zodiac_calculator
        name: String,
        /// JSON arguments, e.g. '{"year": 1990}'
        #[arg(default_value = "{}")]
        input: String,
    },
    /// Show current configuration
    Config,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("augur=info,warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    // Commands that need no config
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "augur", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::Tool { name, input }) => {
            let input: serde_json::Value = serde_json::from_str(input)?;
            let output = augur_tools::run_tool(name, input)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }
        _ => {}
    }

    let mut config = load_config(&cli.config)?;
    augur_llm::prepare_config(&mut config);

    if let Some(Commands::Config) = &cli.command {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let llm = augur_llm::build_client(&config)?;
    let retriever = augur_retrieval::build_retriever(&config.retrieval)?;
    info!(
        provider = %config.model.provider,
        model = %config.model.model_id,
        retriever = retriever.name(),
        "Pipeline ready"
    );
    let pipeline = Pipeline::new(&config, llm, retriever);

    match cli.command {
        Some(Commands::Serve) => {
            let gateway_config = config.gateway.clone().unwrap_or_default();
            info!(bind = %gateway_config.bind, "Starting HTTP gateway");
            let server = augur_gateway::GatewayServer::new(gateway_config, pipeline);
            let cancel = tokio_util::sync::CancellationToken::new();
            let cancel_clone = cancel.clone();

            // Graceful shutdown on Ctrl-C
            tokio::spawn(async move {
                tokio::signal::ctrl_c().await.ok();
                info!("Shutting down gateway...");
                cancel_clone.cancel();
            });

            server.run(cancel).await?;
        }
        Some(Commands::Ask { question }) => {
            let mut text = question.join(" ");
            if text.trim().is_empty() {
                text = io::stdin()
                    .lock()
                    .lines()
                    .map_while(|l| l.ok())
                    .collect::<Vec<_>>()
                    .join("\n");
            }
            if text.trim().is_empty() {
                anyhow::bail!("no question given");
            }
            ask(&pipeline, &text).await?;
        }
        Some(Commands::Config | Commands::Completions { .. } | Commands::Tool { .. }) => {}
        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

fn load_config(path: &PathBuf) -> anyhow::Result<AppConfig> {
    if path.exists() {
        info!(path = %path.display(), "Loading config");
        return Ok(AppConfig::load(path)?);
    }

    if let Some(home) = std::env::var("HOME").ok().map(PathBuf::from) {
        let home_config = home.join(".augur").join("config.toml");
        if home_config.exists() {
            info!(path = %home_config.display(), "Loading config from home directory");
            return Ok(AppConfig::load(&home_config)?);
        }
    }

    eprintln!("Warning: No config file found. Set DASHSCOPE_API_KEY or create augur.toml");
    eprintln!("See augur.toml.example for reference.");
    Ok(AppConfig::from_env())
}

/// Stream one answer to stdout; progress goes to stderr.
async fn ask(pipeline: &Pipeline, question: &str) -> anyhow::Result<()> {
    let mut events = pipeline.stream(question);
    let mut stdout = io::stdout();

    while let Some(event) = events.next().await {
        match event {
            StreamEvent::Status { content } => eprintln!("[{}]", content),
            StreamEvent::Token { content } => {
                print!("{}", content);
                stdout.flush().ok();
            }
            StreamEvent::Done => println!(),
            StreamEvent::Error { error } => {
                println!();
                anyhow::bail!(error);
            }
        }
    }
    Ok(())
}
