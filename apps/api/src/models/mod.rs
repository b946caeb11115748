pub mod posting;
pub mod user;
