pub mod engine;
pub mod event_bus;
pub mod scheduler;
pub mod state;
pub mod tasks;
