//! Core data models for the photo service.
//!
//! `PhotoMetadata` maps to the `photo_metadata` table via `sqlx::FromRow`;
//! `ImageMetadata` is the extractor's output and never touches the database
//! directly.

pub mod image_metadata;
pub mod photo;
