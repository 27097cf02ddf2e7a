pub mod export;
pub mod fetch;
pub mod init;
pub mod migrate;
pub mod status;
pub mod track;
