pub mod market;
pub mod operations;
