//! Entry points driving the application.

pub mod cli;
