//! # Shakesearch
//!
//! In-memory full-text search over a single static corpus.
//!
//! The corpus is read once at startup and indexed with a suffix array. Each
//! query is a case-insensitive regular expression; results are fixed-width
//! snippets around each match, paged by the number of matches the caller has
//! already seen.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Corpus file  │──▶│ SuffixIndex  │──▶│ SearchEngine │
//! └──────────────┘   └──────────────┘   └──────┬───────┘
//!                                              │ Arc
//!                          ┌───────────────────┤
//!                          ▼                   ▼
//!                     ┌──────────┐       ┌──────────┐
//!                     │   CLI    │       │   HTTP   │
//!                     └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! shakesearch search "drunk"                 # first page on the terminal
//! shakesearch search "drunk" --existing 20   # next page
//! PORT=8080 shakesearch serve                # HTTP server + static UI
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and `PORT` override |
//! | [`engine`] | Corpus loading, search, windowing, pagination |
//! | [`index`] | Suffix array over the case-folded corpus |
//! | [`search`] | CLI search command |
//! | [`server`] | HTTP server |

pub mod config;
pub mod engine;
pub mod index;
pub mod search;
pub mod server;
