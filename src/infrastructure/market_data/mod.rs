pub mod yahoo_chart;

pub use yahoo_chart::YahooChartMarketDataService;
