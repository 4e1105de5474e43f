//! Integration tests entry point
//!
//! This file serves as the entry point for the end-to-end tests in
//! `integration_tests`, which wire the real HTTP client, authenticator and
//! notification channels against a local mock server.

mod integration_tests;
