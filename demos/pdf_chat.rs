//! Interactive terminal chat over a PDF.
//!
//! ```text
//! cargo run --example pdf_chat -- path/to/document.pdf
//! ```

use anyhow::{Context, Result};
use docqa::prelude::*;
use std::io::{BufRead, Write};

#[tokio::main]
async fn main() -> Result<()> {
    // Keep library logs quiet while chatting
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("docqa_core=info")),
        )
        .init();

    let pdf = std::env::args()
        .nth(1)
        .context("usage: pdf_chat <document.pdf>")?;

    let config = Config::load_or_default().context("Failed to load config.yaml")?;
    let provider = provider::from_config(&config)?;
    let engine = RagEngine::new(&config, provider)?;

    println!("{}\n", engine.process_pdf(&pdf).await?);

    let stdin = std::io::stdin();
    loop {
        print!("Question: ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        if input == "exit" || input == "quit" {
            break;
        }

        match engine.query(input).await {
            Ok(result) => {
                println!("\n{}\n", result.answer);
                for chunk in &result.sources {
                    println!("  - page {} ({} chars)", chunk.metadata.page, chunk.char_len());
                }
                println!();
            }
            Err(e) if e.kind() == ErrorKind::Validation => continue,
            Err(e) => eprintln!("error: {}\n", e),
        }
    }

    Ok(())
}
