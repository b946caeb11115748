//! Job ingestion: field extraction, relevance scoring, and the orchestrator
//! that ties feed fetching to persistence.

pub mod extractor;
pub mod handlers;
pub mod orchestrator;
pub mod samples;
pub mod scoring;
