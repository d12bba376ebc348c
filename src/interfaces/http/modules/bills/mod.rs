//! Bills, their payments and late fees

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
