pub mod entity;
pub mod map;
pub mod meta;
pub mod rules;
pub mod tile;
