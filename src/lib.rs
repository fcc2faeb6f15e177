// src/lib.rs

pub mod app_state;
pub mod config;
pub mod share;
pub mod storage;
