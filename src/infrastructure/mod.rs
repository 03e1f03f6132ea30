pub mod db;
pub mod remote_store;
pub mod sqlite_command_store;
pub mod sqlite_repo;
