pub mod all;
pub mod build;
pub mod clean;
pub mod edit;
pub mod init;
pub mod publish;
