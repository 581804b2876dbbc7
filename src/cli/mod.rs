mod dispatch;

pub use dispatch::{build_cli, ClapDispatcher, Dispatcher};
