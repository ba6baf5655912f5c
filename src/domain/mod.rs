pub mod entities;
pub mod scoring;
