//! # Quarry Core
//!
//! In-memory indexed retrieval engine for the consulting portal's command
//! palette, knowledge base and content library.
//!
//! The same engine is instantiated three times (see [`catalog`]). Each instance
//! owns a record store plus the indices derived from it, answers ranked
//! full-text queries with highlight extraction, and scores pairwise similarity
//! for recommendations.
//!
//! ## Modules
//!
//! - [`search`] - Tokenizer, indices, query engine, recommender, validator
//! - [`storage`] - Canonical record store and snapshot import/export
//! - [`catalog`] - Typed instantiations (commands, knowledge base, content library)
//! - [`config`] - Scoring defaults and [`EngineConfig`](config::EngineConfig)
//! - [`error`] - Error types for configuration and snapshot handling

#![forbid(unsafe_code)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod search;
pub mod storage;
