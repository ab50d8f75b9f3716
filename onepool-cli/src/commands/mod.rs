pub mod pool;
pub mod state;
pub mod token;

pub use pool::{cancel, events, init, play, resolve, resume, status, stop, InitArgs};
pub use token::{approve, balance, faucet, fund, transfer, TokenKind};
