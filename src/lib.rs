// Library exports for the binary and integration tests

pub mod api;
pub mod cloud_storage;
pub mod config;
pub mod discogs;
pub mod image_proxy;
pub mod import;
pub mod models;
