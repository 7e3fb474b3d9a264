#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Shared models, view-model normalization, and configuration for the
//! Campus Admin client core.

pub mod config;
pub mod models;
pub mod normalize;
