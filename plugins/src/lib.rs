pub mod compact;
pub mod credits;
pub mod factory;
pub mod modules;
pub mod observers;
