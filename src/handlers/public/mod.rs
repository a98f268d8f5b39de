// handlers/public/mod.rs - routes reachable without a signed-in session

pub mod auth;
pub mod register;
pub mod webhook;

pub use webhook::webhook;
