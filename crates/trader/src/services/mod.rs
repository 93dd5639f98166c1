pub mod execution_service;
pub mod notify;
pub mod pipeline;
pub mod synthesizer;
