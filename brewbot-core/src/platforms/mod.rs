// File: src/platforms/mod.rs

pub mod octoplus;

pub use octoplus::OctoplusClient;
