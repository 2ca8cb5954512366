// src/clients/mod.rs
//! HTTP clients for the external collaborators: content generation,
//! LaTeX compilation, and profile data. Each sits behind a trait so the
//! orchestrator and extraction engine can be exercised without a network.

pub mod compiler;
pub mod content;
pub mod profile;

pub use compiler::{CompileError, CompilerClient, LatexCompiler};
pub use content::{ContentClient, ContentProvider, ExtractedPosting, OptimizedContent};
pub use profile::{ProfileClient, ProfileData, ProfileSource};
