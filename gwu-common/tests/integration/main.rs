#[path = "../common/mod.rs"]
mod common;

mod engine_tests;
mod properties_tests;

#[ctor::ctor]
fn setup() {
    common::init_test_logging();
}
