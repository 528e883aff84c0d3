pub mod images;
pub mod plan;
pub mod reconcile;
pub mod services;
