pub mod config;
pub mod interfaces;
pub mod lifecycle;
pub mod profile;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
