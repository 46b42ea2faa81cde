//! HTTP routing helpers.

pub mod routes;

pub use routes::RouteModule;
