pub mod event;
pub mod level;
pub mod replay;
pub mod save;
pub mod session;
pub mod step;
