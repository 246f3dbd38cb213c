pub mod image_service;
pub mod local_store;
pub mod metadata_store;
pub mod object_store;
pub mod photo_service;
pub mod s3_store;
