//! Infrastructure layer - Cache backends, contact stores and services

pub mod cache;
pub mod logging;
pub mod observability;
pub mod services;
pub mod storage;
