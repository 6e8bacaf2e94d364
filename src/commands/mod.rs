pub mod config;
pub mod replay;
pub mod selector;

#[cfg(test)]
#[path = "../commands_test.rs"]
mod commands_test;
