// src/handlers/mod.rs

pub mod admin;
pub mod assignment;
pub mod auth;
pub mod chat;
pub mod leaderboard;
pub mod project;
pub mod quiz;
