//! Integration Tests Module
//!
//! Integration tests for the Konspekt desktop backend. Tests cover the
//! process supervisor, the run-process pipeline flow, and the settings and
//! prompt stores.

// Scripted spawner, recording clock and state builders
mod support;


// Staging and pipeline argument assembly tests
mod pipeline_test;
