//! The outermost layer: HTTP/WebSocket transport over `application`.
//!
//! Generalizes the teacher's `api::{auth,rest,ws}` modules (bearer-token
//! extractor, `tower-http` CORS/trace layers, one router builder consuming
//! an `Arc`-wrapped central state) to the multi-user, JWT-authenticated
//! surface spec §6 names.

pub mod http;
