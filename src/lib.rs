//! Bezy project: masters, skeleton layers and property resolution for
//! multi-master font projects
pub mod core;
pub mod data;
pub mod io;
pub mod logging;
pub mod model;
pub mod project;
pub mod rules;
#[cfg(test)]
mod tests;
