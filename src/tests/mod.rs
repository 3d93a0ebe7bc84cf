// Test modules for all components
mod common;

pub mod test_model;
pub mod test_sync;
