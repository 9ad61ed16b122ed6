pub mod cache;
pub mod types;
pub mod weatherapi;
