//! External system integrations for LexRedact.
//!
//! - [`llm`] - Generative model backends (local model server, remote
//!   chat-completion API) and the rewriter built on them
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with mock implementations. The pipeline only sees the
//! `GenerativeBackend` trait:
//!
//! ```rust,no_run
//! use lexredact::adapters::llm::{create_backend, PromptTemplate, Rewriter};
//! use lexredact::config::ProviderConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = create_backend(&ProviderConfig::default())?;
//! let rewriter = Rewriter::new(backend);
//!
//! let text = rewriter
//!     .rewrite("[ЛИЦО-1] явился в суд.", PromptTemplate::Finalization)
//!     .await?;
//! println!("{text}");
//! # Ok(())
//! # }
//! ```

pub mod llm;
