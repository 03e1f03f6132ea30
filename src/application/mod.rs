pub mod board_service;
pub mod board_session;
pub mod input;
pub mod renderer;
pub mod todo_service;
mod todo_service_tests;
