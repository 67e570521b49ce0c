//! Domain layer - Core business logic and entities

pub mod error;
pub mod experiment;

pub use error::DomainError;
