// Library for tests to access modules

pub mod client;
pub mod config;
pub mod metrics;
pub mod models;
pub mod routes;
pub mod sampler;
pub mod version;
pub mod worker;
