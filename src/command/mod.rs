pub mod interpreter;
pub mod normalizer;
pub mod profiles;
pub mod types;
