//! Business logic services.

pub mod registry_service;

pub use registry_service::RegistryService;
