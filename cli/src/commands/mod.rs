pub mod batch;
pub mod call;
pub mod cli;
pub mod tools;
