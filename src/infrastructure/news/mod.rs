pub mod trending;
pub mod yahoo_rss;
pub mod yahoo_search;

pub use trending::YahooTrendingSource;
pub use yahoo_rss::YahooRssNewsSource;
pub use yahoo_search::YahooSearchNewsSource;
