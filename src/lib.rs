pub mod api_router;
pub mod assistant;
pub mod auth;
pub mod config;
pub mod email;
pub mod leads;
pub mod opportunities;
pub mod scoring;
pub mod shared;
pub mod tasks;
