#![allow(clippy::unwrap_used)]

#[path = "helpers/mod.rs"]
mod helpers;

#[path = "engine/mod.rs"]
mod engine;

#[path = "ide/mod.rs"]
mod ide;
