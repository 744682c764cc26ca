pub mod feed;
pub mod service;

pub use feed::{fetch_news, parse_news_json, CoverImage, NewsItem};
pub use service::NewsService;
