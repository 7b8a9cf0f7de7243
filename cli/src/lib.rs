//! toolgate CLI library, split out so command handlers can be unit tested.

pub mod commands;
