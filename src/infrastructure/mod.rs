//! Infrastructure layer - Engine implementations around the domain core

pub mod experiment;
pub mod services;
