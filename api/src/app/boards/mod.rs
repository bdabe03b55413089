//! Subscription boards
//!
//! One module per supported site. Each board owns its descriptor and talks to
//! the outside world only through the panel and resolver ports.

pub mod aladdinnet;
pub mod netsyo;
pub mod xboard;

pub use aladdinnet::AladdinNetwork;
pub use netsyo::Netsyo;
pub use xboard::XBoard;
