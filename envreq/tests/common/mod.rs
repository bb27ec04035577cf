#![allow(dead_code)]

pub mod assertions;
pub mod logging;

pub use assertions::{assert_contains, assert_not_contains};
pub use logging::init_test_logging;

use envreq::{MapEnv, Registry};
use std::sync::Arc;

/// Registry over an in-memory environment, plus a handle to inspect reads.
pub fn registry_with(vars: &[(&str, &str)]) -> (Arc<Registry>, Arc<MapEnv>) {
    let env: Arc<MapEnv> = Arc::new(vars.iter().copied().collect());
    (Arc::new(Registry::with_source(env.clone())), env)
}
