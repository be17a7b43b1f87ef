//! Con-Maze: a terminal maze of rooms, keys, doors and passages whose
//! saves are nothing more than the moves that were made.

pub mod config;
pub mod domain;
pub mod logging;
pub mod sim;
pub mod store;
