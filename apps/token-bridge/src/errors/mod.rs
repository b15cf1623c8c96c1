//! Error handling for the token bridge.

pub mod domain;
pub mod error_code;

pub use domain::ExchangeError;
pub use error_code::ErrorCode;
