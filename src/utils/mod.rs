pub mod env_merge;
pub mod executor;
pub mod paths;
