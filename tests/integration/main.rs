//! Integration tests for lingbuzz-sync

mod sync_tests;
