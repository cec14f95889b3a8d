mod dump;
mod root;

pub use dump::DumpCommand;
pub use root::Cli;
