//! # Portfolio RAG
//!
//! Retrieval-augmented chat over a personal portfolio.
//!
//! Portfolio text (bio, projects, experience) is split into sentence-aligned
//! chunks, embedded once into a JSON corpus artifact, and searched by cosine
//! similarity at question time. The best matches become a bounded context
//! block that is handed to a chat model alongside the visitor's question.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌─────────────────┐
//! │ data.json   │──▶│ Chunk+Embed │──▶│ embeddings.json │
//! │ {id, text}  │   │ folio index │   │ {id,text,vec}   │
//! └─────────────┘   └─────────────┘   └────────┬────────┘
//!                                              │ loaded once
//!                      ┌───────────────────────┤
//!                      ▼                       ▼
//!                 ┌──────────┐           ┌──────────┐
//!                 │   CLI    │           │   HTTP   │
//!                 │ (folio)  │           │ /api/chat│
//!                 └──────────┘           └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! folio index --dry-run          # preview chunking
//! folio index                    # embed and write the corpus
//! folio retrieve "rust projects" --explain
//! folio ask "Which projects used Rust?"
//! folio serve                    # start the chat endpoint
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`corpus`] | Corpus artifact and source feed I/O |
//! | [`embedding`] | Embedding providers |
//! | [`completion`] | Chat-completion client |
//! | [`chat`] | Retrieval-augmented answering |
//! | [`server`] | HTTP chat server |
//! | [`index_cmd`] | `folio index` |
//! | [`retrieve_cmd`] | `folio retrieve` and `folio ask` |
//! | [`stats`] | `folio stats` |
//!
//! The chunker, similarity, ranking, and prompt assembly live in
//! [`portfolio_rag_core`], which performs no I/O.

pub mod chat;
pub mod completion;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod http;
pub mod index_cmd;
pub mod logging;
pub mod retrieve_cmd;
pub mod server;
pub mod stats;
