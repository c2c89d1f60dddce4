// src/api/handlers/mod.rs
pub mod cancellation_handler;
pub mod system_handler;
