//! # Utility Billing Service
//!
//! Progressive (slab-based) electricity tariff rating and bill composition,
//! with the services, storage and REST API around them.
//!
//! ## Architecture
//!
//! - **domain**: slab tables, the rate resolver, the bill composer, bills,
//!   payments and the repository ports. Pure and synchronous.
//! - **application**: tariff and billing services, event bus
//! - **infrastructure**: SeaORM (SQLite) and in-memory repositories
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: runtime bootstrap and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod support;

pub use config::{default_config_path, AppConfig};

pub use infrastructure::{init_database, DatabaseConfig, InMemoryStorage, SeaOrmRepositoryProvider};

pub use interfaces::http::create_api_router;

pub use application::{create_event_bus, Event, EventBus, SharedEventBus};
