pub mod context;
pub mod pipeline;

pub use context::RuntimeContext;
pub use pipeline::ScrapeEngine;
