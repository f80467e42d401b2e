//! Shared utility modules used across Lorekeeper components.

pub mod simd;
