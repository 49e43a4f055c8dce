pub mod analyzer;
pub mod classifier;
pub mod handlers;
pub mod prompts;
pub mod repository;
