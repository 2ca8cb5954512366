// src/web/handlers/mod.rs
pub mod event_handlers;
pub mod posting_handlers;
pub mod resume_handlers;

pub use event_handlers::*;
pub use posting_handlers::*;
pub use resume_handlers::*;
