pub mod bootstrap;
pub mod config;
pub mod storage;
pub mod upstream;
