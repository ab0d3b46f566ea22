pub mod beep;
pub mod output;
pub mod recognition;
