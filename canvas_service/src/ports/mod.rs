pub mod artifact_repository;
pub mod component_generator;
pub mod embedding_service;
pub mod vector_index;
