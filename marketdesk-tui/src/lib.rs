//! Marketdesk admin console.
//!
//! One screen per marketplace resource. Every screen drives the same
//! controllers from `marketdesk-core` through the matching adapter from
//! `marketdesk-client`.

pub mod config;
pub mod error;
pub mod events;
pub mod keys;
pub mod logging;
pub mod nav;
pub mod notifications;
pub mod persistence;
pub mod screen;
pub mod state;
pub mod theme;
pub mod views;
pub mod widgets;
