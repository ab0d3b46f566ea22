pub mod gesture;
pub mod input;
pub mod locator;
