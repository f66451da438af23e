//! A crate to emulate a contactless smart card answering command APDUs from a reader.

mod trace;

pub mod codec;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod echo;
pub mod nfc;
pub mod service;
pub mod status;

pub use config::{Aid, Config};
pub use dispatcher::Dispatcher;
pub use echo::Echo;
pub use nfc::Applet;
pub use service::{DeactivationReason, HostCardService, Lifecycle};
pub use status::StatusWord;
