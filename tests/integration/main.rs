//! Integration tests for oplogger.

mod helpers;

mod cli_test;
mod pipeline_test;
