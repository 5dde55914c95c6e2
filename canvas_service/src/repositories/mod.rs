pub mod artifact_in_memory_repository;
pub mod artifact_point_qdrant_repository;
pub mod artifact_postgres_repository;
pub mod artifact_vector_in_memory_index;
