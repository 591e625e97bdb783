//! Soil Advisory Engine
//!
//! Maps one set of soil test measurements to agronomic recommendations.

mod engine;

pub use engine::{
    soil_recommendations, Advisory, AdvisoryConfig, AdvisoryEngine, Attribute, Band, Level,
    Measurements,
};
