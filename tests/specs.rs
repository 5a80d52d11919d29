#[path = "specs/flow/mod.rs"]
mod flow;
