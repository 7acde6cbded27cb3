pub mod actions;
pub mod collector;
pub mod cpu;
pub mod platform;
pub mod process;
pub mod sampler;
pub mod snapshot;
