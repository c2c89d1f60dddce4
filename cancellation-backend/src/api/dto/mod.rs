// src/api/dto/mod.rs
pub mod cancellation_dto;

pub use cancellation_dto::{DownsellOfferDto, SubmitCancellationDto, SubmitCancellationResponseDto};
