pub mod article;
pub mod gdelt;
pub mod region;
pub mod response;
pub mod retry;
pub mod status;
pub mod task;
