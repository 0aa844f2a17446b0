#[path = "../common/mod.rs"]
mod common;

mod collisions;
mod lifecycle;
mod plugin;
mod runner;
