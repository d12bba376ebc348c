//! HTTP REST API
//!
//! - `common`: response envelope, error mapping, validated JSON
//! - `modules`: handlers and DTOs per resource
//! - `router`: route table and OpenAPI document

pub mod common;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc, ApiState};
