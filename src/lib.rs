//! Terminal chat client for the Sage personalities.
//!
//! The conversation store and the two request flows live under [`cli::chat`]; the HTTP
//! backend is [`sage_client::SageClient`].

pub mod cli;
pub mod config;
pub mod sage_client;
