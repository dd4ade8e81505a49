//! Integration tests for the snapshot operator console

mod create_pipeline;
mod delete_pipeline;
mod lock_guard;
mod test_utils;
mod validate_pipeline;
