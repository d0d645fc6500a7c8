//! Test suites for the Postbox pipeline.

pub(crate) mod support;
