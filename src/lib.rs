pub mod bootstrap;
pub mod config;
pub mod delivery;
pub mod errors;
pub mod feature;
pub mod generation;
pub mod host;
pub mod runner;
pub mod ui;
pub mod vcs;
pub mod workspace;
