pub mod delete;
pub mod init;
pub mod migrate;
pub mod show;
