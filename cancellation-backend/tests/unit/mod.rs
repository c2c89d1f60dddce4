// tests/unit/mod.rs

pub mod service_tests;
