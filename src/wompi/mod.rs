pub mod client;
pub mod signature;
pub mod types;

pub use client::{WompiClient, WompiError};
pub use signature::SignatureError;
