pub mod content;
pub mod dom;
pub mod fetcher;
pub mod indexer;
pub mod selectors;
pub mod strategy;

pub use fetcher::PostFetcher;
pub use indexer::PostIndexer;
pub use strategy::ExtractionPlan;
