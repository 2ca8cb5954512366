// src/lib.rs
//! Job-posting extraction and resume-generation pipeline.
//!
//! Two asynchronous workflows behind one HTTP surface: a strategy-chain
//! extractor that turns posting URLs into structured job data, and a
//! staged generator that turns a fetched posting plus the user's profile
//! into a compiled PDF resume. Both report progress over per-entity
//! server-sent event streams.

pub mod clients;
pub mod database;
pub mod environment;
pub mod error;
pub mod events;
pub mod extraction;
pub mod generation;
pub mod models;
pub mod repository;
pub mod retry;
pub mod storage;
pub mod utils;
pub mod web;

pub use environment::{EnvironmentConfig, TimeoutConfig};
pub use error::PipelineError;
