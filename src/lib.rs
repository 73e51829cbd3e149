pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod interface;
pub mod ports;
