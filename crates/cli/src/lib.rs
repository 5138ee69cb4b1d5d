//! Command-line front end for devstart.

pub mod cli;
pub mod error;
pub mod logging;
pub mod output;
pub mod run;
pub mod styles;
