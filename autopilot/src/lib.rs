pub mod benchmark;
pub mod config;
pub mod controllers;
pub mod protocol;
pub mod runner;
pub mod util;
