//! HTTP surfaces.
//!
//! | Surface | Routes |
//! |---------|--------|
//! | fetch | `GET /health`, `GET /status`, `POST /fetch` |
//! | query | `GET /health`, `GET /latest` |

mod error;
mod fetch_api;
mod query_api;

pub use error::AppError;
pub use fetch_api::router as fetch_router;
pub use query_api::router as query_router;
