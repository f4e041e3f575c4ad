pub mod api;
pub mod emoji;
pub mod models;
