//! One module per subcommand.

pub mod decrypt;
pub mod encrypt;
pub mod verify;
