pub mod errors;
pub mod ownership;
pub mod pagination;
pub mod schema;
pub mod state;
pub mod utils;

pub use errors::ApiError;
