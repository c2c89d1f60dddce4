// src/repository/mod.rs
pub mod cancellation_repository;
pub mod subscription_repository;
