//! Mall customer analytics dashboard with an LLM question box.
//!
//! The binary loads a customer CSV once, serves a single-page dashboard
//! whose filters recompute four chart specs, and forwards free-text
//! questions to an OpenAI-compatible chat-completion endpoint.

pub mod analytics;
pub mod charts;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod filter;
pub mod llm;
pub mod web;
