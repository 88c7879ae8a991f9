pub mod barcode;
pub mod client;
pub mod models;
pub mod rate_gate;
pub mod transform;

pub use barcode::{validate_barcode, BarcodeError};
pub use client::{DiscogsClient, DiscogsError, ReleaseCatalog};
pub use models::{DiscogsRelease, DiscogsSearchResponse, DiscogsSearchResult, RateLimit};
pub use rate_gate::RateGate;
