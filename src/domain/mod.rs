// Domain layer - AQI math and the values flowing through the pipeline
pub mod alert;
pub mod aqi;
pub mod reading;
