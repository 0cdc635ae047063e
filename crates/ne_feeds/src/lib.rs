pub mod feeds;
pub mod manager;

pub use feeds::rss::RssFetcher;
pub use feeds::{load_feeds, FeedConfig, FeedSource};
pub use manager::{EventFailure, FeedFailure, IngestionReport, IngestionService};

pub mod prelude {
    pub use super::feeds::{FeedConfig, FeedSource};
    pub use super::manager::{IngestionReport, IngestionService};
    pub use ne_core::{Error, Event, RawArticle, Result};
}
