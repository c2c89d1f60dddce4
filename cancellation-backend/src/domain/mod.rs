// src/domain/mod.rs
pub mod cancellation_flow;
pub mod cancellation_model;
pub mod subscription_model;
