#![doc = "The `taskboard` library crate."]
#![doc = ""]
#![doc = "Domain models, the token service and auth gate, the ownership-scoped project/task"]
#![doc = "services, the stores behind them, routing configuration and error handling."]
#![doc = "The binary (`main.rs`) wires these into an actix-web server; `client` is a typed"]
#![doc = "consumer of the same HTTP API."]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod graph;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use error::AppError;
pub use state::AppState;
