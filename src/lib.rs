pub mod config;
pub mod dataset;
pub mod demo_data;
pub mod engine;
pub mod export;
pub mod filter;
pub mod http_cache;
pub mod http_client;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod parsing;
pub mod profiles;
pub mod provider;
pub mod ranking;
pub mod reports_db;
pub mod scatter;
pub mod scouting_db;
pub mod sheet_fetch;
pub mod state;
pub mod statsbomb_fetch;
