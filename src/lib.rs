//! An in-process X11-style window server.
//!
//! Displays connect to a [`Server`], build a tree of windows, draw into them
//! through graphics contexts and receive protocol-style events. All windows
//! are composited into one [`render::Surface`] that is handed to a
//! [`render::Presenter`] on every refresh.

#![allow(
    clippy::len_zero,
    clippy::needless_lifetimes,
    clippy::enum_variant_names,
    clippy::new_without_default,
    clippy::too_many_arguments
)]

#[macro_use]
mod macros;
pub mod config;
pub mod display;
pub mod drawable;
pub mod event;
pub mod gc;
pub mod input;
pub mod logger;
pub mod rect;
pub mod render;
pub mod server;
pub mod timer;
pub mod tree;
pub mod utils;

pub use {
    config::{ConfigError, ServerConfig},
    display::{Display, DisplayId, Screen},
    event::{Event, EventKind, EventMask},
    server::{Backends, Server, ServerError},
    tree::WindowId,
};
