pub mod browser;
pub mod downloader;
pub mod middleware;
pub mod navigator;
pub mod service;

pub use downloader::Downloader;
pub use navigator::BrowserNavigator;
pub use service::HttpService;
