//! Helpers to run MAC engines against a simulated radio medium.

pub mod aether;
pub mod run;
