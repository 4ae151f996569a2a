// src/tasks/mod.rs

pub mod claim_cycle;
pub mod state_cleanup;

pub use claim_cycle::spawn_claim_cycle_task;
pub use state_cleanup::spawn_state_cleanup_task;
