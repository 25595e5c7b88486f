// Presentation layer - Rendering reports for humans
pub mod report;
