//! Testing utilities for coursegate routers
//!
//! Requests run through the router in-process with `tower::ServiceExt::oneshot`;
//! no socket is bound.

mod scenario;

pub use scenario::{Scenario, ScenarioAssert, get, post};
