#![cfg(test)]

//! Test logging for unit tests.
//!
//! Delegates to the shared test-support crate so unit and integration tests
//! use one subscriber configuration. Level comes from `TEST_LOG`, then
//! `RUST_LOG`, defaulting to `warn`.

pub fn init() {
    bridge_test_support::logging::init();
}
