//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain services. Handlers map
//! the public DTOs from the `shared` crate onto domain commands and domain
//! errors onto HTTP status codes.

pub mod rest;
