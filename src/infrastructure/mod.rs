// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod console_notifier;
pub mod gmail_notifier;
pub mod oauth_token;
pub mod purpleair_client;
