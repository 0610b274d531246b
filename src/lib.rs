pub mod config;
pub mod fit;
pub mod input;
pub mod loan;
pub mod output;
pub mod policy;
pub mod server;
