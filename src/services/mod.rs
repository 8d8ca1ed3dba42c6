// src/services/mod.rs
pub mod notification_service;
pub mod push_service;
pub mod subscription_service;
