#![forbid(unsafe_code)]

pub mod http;
mod memory;
pub mod repository;
