pub mod commands;
pub mod dispatcher;
pub mod runner;

pub use commands::{Command, CommandParser};
pub use dispatcher::{Dispatcher, Replier};
pub use runner::run;
