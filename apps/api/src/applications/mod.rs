pub mod handlers;
pub mod recorder;
