pub mod app;
pub mod checkpoint;
pub mod config;
pub mod domain;
pub mod error;
pub mod output;
pub mod pubchem;
pub mod table;
