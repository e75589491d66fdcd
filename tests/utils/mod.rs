pub mod actions;
pub mod assertions;
pub mod fakes;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use actions::TestResponse;
#[allow(unused_imports)]
pub use fakes::FastHasher;
#[allow(unused_imports)]
pub use setup::{TestSetup, TestSetupBuilder};
