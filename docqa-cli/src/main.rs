use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use docqa_core::config::Config;
use docqa_core::server::{send_request, Reply, Request, RequestType};
use docqa_core::{provider, RagEngine, Server};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Ask questions about a PDF document", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Show current configuration")]
    Show,

    #[command(about = "Model management commands")]
    Model {
        #[command(subcommand)]
        command: ModelCommands,
    },

    #[command(about = "Index a PDF and answer one question about it")]
    Ask {
        #[arg(help = "Path to the PDF file")]
        pdf: PathBuf,

        #[arg(help = "Question to ask about the document")]
        question: String,
    },

    #[command(about = "Run the socket server")]
    Serve,

    #[command(about = "Upload a PDF to a running server")]
    Upload {
        #[arg(help = "Path to the PDF file")]
        pdf: PathBuf,
    },

    #[command(about = "Ask a running server a question")]
    Chat {
        #[arg(help = "Question to ask about the uploaded document")]
        question: String,
    },

    #[command(about = "Show what a running server has indexed")]
    Stats,
}

#[derive(Subcommand)]
enum ModelCommands {
    #[command(about = "Show current models")]
    Show,

    #[command(about = "Set the generation model")]
    Set {
        #[arg(help = "Model name (e.g., 'llama3.2:latest' or 'gpt-4o-mini')")]
        model: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docqa_core=warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Show => show_config(&cli.config),
        Commands::Model { command } => match command {
            ModelCommands::Show => show_model(&cli.config),
            ModelCommands::Set { model } => set_model(&cli.config, &model),
        },
        Commands::Ask { pdf, question } => ask(&cli.config, &pdf, &question).await,
        Commands::Serve => serve(&cli.config).await,
        Commands::Upload { pdf } => {
            let path = std::fs::canonicalize(&pdf)
                .with_context(|| format!("Cannot find {}", pdf.display()))?;
            remote(&cli.config, Request::upload(path.to_string_lossy())).await
        }
        Commands::Chat { question } => remote(&cli.config, Request::chat(question)).await,
        Commands::Stats => {
            let request = Request {
                request_type: RequestType::Stats,
                content: String::new(),
                filename: None,
            };
            remote(&cli.config, request).await
        }
    }
}

/// Loads the config file if present, otherwise falls back to defaults.
fn load_config(config_path: &Path) -> Result<Config> {
    Config::load_or_default_from(config_path).context("Failed to load config")
}

fn show_config(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;

    println!("{}", "Current Configuration:".bold().green());
    println!();
    println!("{}", "LLM:".bold());
    println!("  Provider:       {:?}", config.llm.provider);
    println!("  Model:          {}", config.llm.model.cyan());
    println!("  Base URL:       {}", config.llm.base_url);
    println!("  Temperature:    {}", config.llm.temperature);
    println!();
    println!("{}", "RAG:".bold());
    println!("  Embedding Model: {}", config.rag.embedding_model.cyan());
    println!("  Chunk Size:      {}", config.rag.chunk_size);
    println!("  Chunk Overlap:   {}", config.rag.chunk_overlap);
    println!("  Top K:           {}", config.rag.top_k);
    println!();
    println!("{}", "Network:".bold());
    println!("  Timeout:         {}s", config.network.request_timeout_secs);
    println!("  Max Retries:     {}", config.network.max_retries);
    println!();
    println!("{}", "Server:".bold());
    println!("  Socket:          {}", config.server.socket_path);

    Ok(())
}

fn show_model(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;

    println!("{}: {}", "Generation model".bold(), config.llm.model.cyan());
    println!("{}: {}", "Embedding model".bold(), config.rag.embedding_model.cyan());
    Ok(())
}

fn set_model(config_path: &Path, model: &str) -> Result<()> {
    let content = std::fs::read_to_string(config_path)
        .context("Failed to read config file")?;

    let mut config: serde_yaml::Value = serde_yaml::from_str(&content)
        .context("Failed to parse config")?;

    let llm = config
        .as_mapping_mut()
        .context("Config file is not a mapping")?
        .entry(serde_yaml::Value::String("llm".to_string()))
        .or_insert_with(|| serde_yaml::Value::Mapping(Default::default()));

    llm.as_mapping_mut()
        .context("'llm' section is not a mapping")?
        .insert(
            serde_yaml::Value::String("model".to_string()),
            serde_yaml::Value::String(model.to_string()),
        );

    let updated_content = serde_yaml::to_string(&config)
        .context("Failed to serialize config")?;

    std::fs::write(config_path, updated_content)
        .context("Failed to write config file")?;

    println!(
        "{} Model updated to: {}",
        "✓".green().bold(),
        model.cyan()
    );

    Ok(())
}

async fn ask(config_path: &Path, pdf: &Path, question: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let provider = provider::from_config(&config).context("Failed to create provider")?;
    let engine = RagEngine::new(&config, provider)?;

    println!("{} Processing {}...", "→".blue(), pdf.display());
    let status = engine.process_pdf(pdf).await?;
    println!("{} {}", "✓".green().bold(), status);
    println!();

    let result = engine.query(question).await?;
    println!("{}", result.answer);
    print_sources(result.sources.iter().map(|c| (c.metadata.page, c.text.as_str())));

    Ok(())
}

async fn serve(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let socket = config.server.socket_path.clone();
    let server = Server::new(config).context("Failed to start server")?;

    println!("{} Listening on {}", "→".blue(), socket.cyan());
    server.start().await?;
    Ok(())
}

async fn remote(config_path: &Path, request: Request) -> Result<()> {
    let config = load_config(config_path)?;
    let reply = send_request(&config.server.socket_path, &request)
        .await
        .with_context(|| {
            format!(
                "Failed to reach server at {}. Is 'docqa serve' running?",
                config.server.socket_path
            )
        })?;

    print_reply(reply)
}

fn print_reply(reply: Reply) -> Result<()> {
    if let Some(error) = reply.error {
        anyhow::bail!("{} error: {}", error.kind, error.message);
    }

    if let Some(stats) = reply.stats {
        let status = if stats.ready { "ready".green() } else { "empty".yellow() };
        println!("{}: {}", "Index".bold(), status);
        println!("{}: {}", "Chunks".bold(), stats.chunks);
        if let Some(source) = stats.source {
            println!("{}: {}", "Document".bold(), source.cyan());
        }
        return Ok(());
    }

    println!("{}", reply.content);
    if let Some(sources) = reply.sources {
        print_sources(sources.iter().map(|s| (s.page_number, s.text.as_str())));
    }
    Ok(())
}

fn print_sources<'a>(sources: impl Iterator<Item = (usize, &'a str)>) {
    let mut sources = sources.peekable();
    if sources.peek().is_none() {
        return;
    }

    println!();
    println!("{}", "Sources:".bold());
    for (i, (page, text)) in sources.enumerate() {
        let preview: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let preview: String = preview.chars().take(160).collect();
        println!(
            "  {} {} {}",
            format!("[{}]", i + 1).cyan(),
            format!("p.{}", page).dimmed(),
            preview
        );
    }
}
