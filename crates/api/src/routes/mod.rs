//! HTTP route handlers

pub mod advisories;
pub mod records;
