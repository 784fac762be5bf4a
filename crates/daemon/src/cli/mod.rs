pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Deploy, Health, Id, Init, Keygen, Remove, Serve, Version};
