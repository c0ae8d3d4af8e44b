pub mod config_store;
pub mod linker;
pub mod runtime_store;
pub mod transcription;
