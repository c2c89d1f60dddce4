// src/service/mod.rs
pub mod cancellation_service;
