pub mod artifact;
pub mod coordinates;
pub mod similarity_pair;
