pub mod cli;
pub mod config;
pub mod generator;
pub mod ingest;
pub mod sink;
pub mod web;
