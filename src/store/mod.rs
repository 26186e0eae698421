pub mod db;
pub mod entity;
pub mod lock;
pub mod port;
