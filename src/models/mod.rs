// Data models for the Keycloak admin API

pub mod keycloak;

pub use keycloak::{RealmSummary, UserDetail, UserSummary};
