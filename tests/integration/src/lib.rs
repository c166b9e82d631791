//! Cross-crate integration tests for the EchoGrid pipeline.
//!
//! These tests exercise the full frame-to-submission path: parser →
//! echo tracker / passive aggregator → submission queue → collector.

pub mod test_utils;

#[cfg(test)]
mod pipeline_tests;

#[cfg(test)]
mod wire_format_tests;
