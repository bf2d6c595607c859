pub mod bot;

pub use bot::{route, Bot, Command};
