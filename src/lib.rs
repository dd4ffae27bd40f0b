//! verbtunnel - HTTP method override scanner
//!
//! Probes web endpoints for servers that honor override headers such as
//! `X-HTTP-Method-Override`, letting a GET or POST be reinterpreted as TRACE
//! or OPTIONS. Each scan sends a baseline OPTIONS request, then a battery of
//! override attempts, and classifies the responses.

pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod report;
pub mod runner;
pub mod scanner;
