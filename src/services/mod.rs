pub mod analyzer;
pub mod export;
pub mod ingest;
pub mod llm;
pub mod normalizer;
pub mod script;
pub mod setup;
pub mod workflow;
