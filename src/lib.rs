//! # CatchAll Harness
//!
//! Agent tools for asynchronous news search on the CatchAll API.
//!
//! A search submits a long-running job, polls it until it finishes (or the
//! wait budget runs out), and caches the records in memory. Follow-up
//! questions are answered by an LLM over the cached records, without
//! running another search.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!  search(raw) ──▶│ QueryNormalizer (LLM rewrite) │
//!                 └──────────────┬───────────────┘
//!                                ▼
//!                 ┌──────────────────────────────┐   submit/status/pull
//!                 │ JobController (poll loop)     │──────────────────▶ CatchAll
//!                 └──────────────┬───────────────┘
//!                                ▼
//!                 ┌──────────────────────────────┐
//!  analyze(q) ───▶│ ResultStore ──▶ Analysis      │──────────────────▶ LLM
//!                 └──────────────────────────────┘
//!                        ▲            ▲           ▲
//!                     CLI (catchall)  HTTP tools  shell
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export CATCHALL_API_KEY=... OPENAI_API_KEY=...
//! catchall search "AI layoffs" --ask "group by industry"
//! catchall shell                # keep the cache across questions
//! catchall serve                # expose the tools over HTTP
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`client`] | CatchAll HTTP job backend |
//! | [`http`] | Shared request retry loop |
//! | [`llm`] | Completion backends |
//! | [`lifecycle`] | Submit / poll / timeout controller |
//! | [`orchestrator`] | `search` and `analyze` |
//! | [`progress`] | Poll progress reporting |
//! | [`tools`] | Agent tool trait and registry |
//! | [`server`] | HTTP tool server |
//! | [`shell`] | Interactive session |
//!
//! Domain types, the result store, query normalization and analysis live in
//! the `catchall_core` crate.

pub mod client;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod llm;
pub mod orchestrator;
pub mod progress;
pub mod server;
pub mod shell;
pub mod tools;
