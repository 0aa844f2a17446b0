#![allow(dead_code)]

mod assertions;
mod helpers;
mod test_app;

// Re-export
pub use assertions::{assert_body_valid, assert_snapshot_valid, assert_vec_eq};
pub use helpers::*;
pub use test_app::{TestApp, TestAppBuilder};
