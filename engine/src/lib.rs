//! Synthetic Identity Engine
//!
//! Generates internally consistent fictional identities for a configured
//! country: an anchor person with traits, education, languages, a family
//! graph and an employment history whose dates all agree with each other.

pub mod batch;
pub mod buckets;
pub mod calendar;
pub mod components;
pub mod error;
pub mod names;
pub mod persistence;
pub mod provider;
pub mod rules;
pub mod sample_data;
pub mod systems;
pub mod validate;
pub mod world;

pub use components::*;
pub use error::{ConfigError, GenerationError};
pub use persistence::{ExportData, ImportResult, PersistenceError};
pub use provider::{CategoricalData, Category, InMemoryData, LookupKey, TableValue};
pub use rules::RuleSet;
pub use validate::{validate, Component, Violation};
pub use world::{GenerationRequest, IdentityGenerator};
