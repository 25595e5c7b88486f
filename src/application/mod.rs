// Application layer - Use cases and collaborator traits
pub mod alert_service;
pub mod notifier;
pub mod sensor_source;
