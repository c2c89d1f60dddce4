// src/config.rs
pub mod app;

pub use app::{
    AppConfig, AuthConfig, AuthMode, DatabaseConfig, DEFAULT_MOCK_USER_EMAIL, DEFAULT_MOCK_USER_ID,
};
