pub mod traits;
pub mod rss_atom;
pub mod registry;

pub use traits::FeedFetcher;
pub use rss_atom::HttpFeedFetcher;
pub use registry::SourceRegistry;
