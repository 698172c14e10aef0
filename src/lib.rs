//! docqa - Ask natural-language questions about a PDF document
//!
//! This is the convenience wrapper crate that re-exports the `docqa-core`
//! engine.
//!
//! # Quick Start
//!
//! ```no_run
//! use docqa::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_default()?;
//! let engine = RagEngine::new(&config, provider::from_config(&config)?)?;
//!
//! engine.process_pdf("paper.pdf").await?;
//! let result = engine.query("What problem does the paper solve?").await?;
//! println!("{}", result.answer);
//! # Ok(())
//! # }
//! ```

// Re-export core
pub use docqa_core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use docqa_core::provider::{self, Provider};
    pub use docqa_core::{Config, ErrorKind, QueryResult, RagEngine, RagError};
}
