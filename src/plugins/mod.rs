//! Plugins for enhancing the default implementation of zmark can be defined in this module.

pub mod guillemets;

#[cfg(feature = "syntect")]
pub mod syntect;
