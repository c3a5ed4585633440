//! Validation and business-rule core for the vehicle service log.
//!
//! Requests pass through a [`pipeline::ValidationPipeline`] (structural and
//! domain rule groups), then a handler that runs the business rule checks
//! and builds entities through their invariant guards, and finally a store
//! port. Every public operation reports through [`outcome::Outcome`].

pub mod auth;
pub mod business_rules;
pub mod clock;
pub mod desk;
pub mod entities;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod outcome;
pub mod pipeline;
pub mod ports;
pub mod provisioning;
pub mod service_entries;
pub mod types;
pub mod validation;
