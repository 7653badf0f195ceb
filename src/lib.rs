//! Nihongo Coach - client core for a Japanese-language coaching platform
//!
//! This library holds everything the learner and staff front ends share:
//! the authenticated HTTP client, session state, route guarding, class
//! settings negotiation and the optimistic list editors.

pub mod api;
pub mod cli;
pub mod config;
pub mod models;
pub mod services;
pub mod session;
pub mod storage;

#[cfg(test)]
mod test_support;
