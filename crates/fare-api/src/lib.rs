//! Fare and place lookups against the Travelpayouts APIs.
//!
//! [`TravelpayoutsClient`] exposes the raw, fallible calls. The
//! [`CityResolver`] and [`FareSource`] traits are the boundary the rest of
//! the bot consumes: their implementations never fail, upstream errors turn
//! into "not found" or an empty offer list and are only logged.

pub mod client;
pub mod config;
pub mod error;
pub mod source;
pub mod types;

pub use client::TravelpayoutsClient;
pub use config::FareApiConfig;
pub use error::FareApiError;
pub use source::{CityResolver, FareSource};
pub use types::{FareOffer, FareRequest};
