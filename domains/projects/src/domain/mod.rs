pub mod access;
pub mod entities;
pub mod lifecycle;
pub mod state;
pub mod subscribers;
pub mod workflow;
