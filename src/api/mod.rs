//! HTTP remote control
//!
//! An axum route table over the symbolic command set plus the query surface.
//! Commands arriving here and keypresses in the terminal front end resolve
//! into the same dispatch, so behavior is identical regardless of origin.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, AppContext};
