pub mod change_feed;
pub mod command;
pub mod command_store;
pub mod repository;
pub mod surface;
pub mod todo;
