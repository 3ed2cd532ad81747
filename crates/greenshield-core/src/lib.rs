//! Core GreenShield client library (session, gateway, navigation, capture).

pub mod api;
pub mod capture;
pub mod config;
pub mod history;
pub mod logging;
pub mod navigation;
pub mod session;
pub mod store;
