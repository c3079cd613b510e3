//! Request and response shapes of the Intelink REST backend.
//!
//! Field names follow the backend's camelCase JSON. Request types that need
//! client-side checks derive `validator::Validate`; those checks run before
//! any request is sent.

pub mod api_key;
pub mod auth;
pub mod billing;
pub mod page;
pub mod short_url;
pub mod statistics;

pub use page::{Page, RawList};
