//! Wickr Stack
//!
//! Declares the Wickr Enterprise deployment: one VPC over two availability
//! zones, the Messaging, Voice/Video and Compliance servers, the security
//! group rules tying them together, their elastic addresses and outputs.

pub mod address;
pub mod error;
pub mod iam;
pub mod instance;
pub mod network;
pub mod outputs;
pub mod parameters;
pub mod props;
pub mod security;
pub mod server;
pub mod stack;
pub mod user_data;

pub use error::{BootstrapError, StackError};
pub use props::StackProps;
pub use server::Server;
pub use stack::WickrStack;
