pub mod config;
pub mod logging;

pub mod aggregate;
pub mod algorithm;
pub mod compute;
pub mod integrity;
pub mod manifest;
pub mod parse;
pub mod report;
pub mod run;
pub mod target;
pub mod verify;
