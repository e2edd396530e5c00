pub mod factory;
pub mod http_client_factory;
pub mod llm;
pub mod market_data;
pub mod mock;
pub mod news;
pub mod persistence;
pub mod repositories;

pub use factory::ServiceFactory;
pub use repositories::InMemoryReportRepository;
