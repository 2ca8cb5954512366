// src/repository/mod.rs
pub mod postings;
pub mod selectors;
pub mod versions;

pub use postings::PostingRepository;
pub use selectors::SelectorRepository;
pub use versions::VersionRepository;
