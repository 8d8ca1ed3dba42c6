// src/models/mod.rs
pub mod notification;
pub mod permission;
pub mod subscription;

pub use notification::*;
pub use permission::*;
pub use subscription::*;
