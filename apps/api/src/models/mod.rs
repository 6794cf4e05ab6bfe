pub mod catalog;
pub mod explanation_request;
pub mod price;
pub mod subscription;
pub mod telemetry;
pub mod user;
