//! Core library: embeddings, the entry store, similarity ranking and search.

pub mod config;
pub mod embeddings;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod ranker;
pub mod search;
pub mod seed;
pub mod store;
