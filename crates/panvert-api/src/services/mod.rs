pub mod jobs;
pub mod staging;
