//! Service Layer - the registry

pub mod registry;

pub use registry::Registry;
