pub mod assertions;
pub mod fixtures;

pub use assertions::{assert_contains, assert_only_keys_changed};
pub use fixtures::{TestProject, process_lock};
pub use logging::init_test_logging;
