pub mod adapters;
pub mod collector;
pub mod worker;
