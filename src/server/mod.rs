//! HTTP surface of the registry.

pub mod allow_list;
pub mod error;
pub mod handlers;
pub mod router;

pub use error::AppError;
pub use allow_list::AllowList;
pub use router::build_router;
