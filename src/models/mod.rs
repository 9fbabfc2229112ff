// src/models/mod.rs

pub mod assignment;
pub mod chat;
pub mod leaderboard;
pub mod project;
pub mod quiz;
pub mod user;
