pub mod parse;
pub mod reduce;
pub mod watch;
