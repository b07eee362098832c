//! Keyword search over a term-frequency index with synonym expansion.
//!
//! The pipeline is [`tokenizer::tokenize`] → [`expander::expand`] →
//! [`ranking::rank`], driven by [`service::QueryService`] against any
//! [`store::IndexStore`].

pub mod error;
pub mod expander;
pub mod index;
pub mod memory;
pub mod persist;
pub mod postgres;
pub mod ranking;
pub mod service;
pub mod store;
pub mod tokenizer;

pub use error::{SearchError, StoreError, ValidationError};
pub use index::*;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use service::{QueryService, SearchOutcome};
pub use store::IndexStore;
