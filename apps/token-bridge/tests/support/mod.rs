#![allow(dead_code)]

pub mod app_builder;
pub mod state;

pub use app_builder::create_test_app;
pub use state::{inbound_claims, test_state, test_state_with, NOW, SECRET};
