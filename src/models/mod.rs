// src/models/mod.rs
pub mod domain_selector;
pub mod job_posting;
pub mod resume_version;

pub use domain_selector::{DomainSelector, SelectorMap};
pub use job_posting::{ExtractionMethod, FetchAttempt, JobPosting, PostingStatus, Provenance};
pub use resume_version::{GenerationStatus, PersonalInfo, ResumeVersion};
