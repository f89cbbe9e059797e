pub mod command;
pub mod output;
pub mod progress;
pub mod scan;
pub mod session;
pub mod stream;
