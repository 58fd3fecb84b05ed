pub mod app;
pub mod data;
pub mod presenter;
pub mod scanning;
