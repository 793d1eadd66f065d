pub mod admin;
pub mod assets;
pub mod backup;
pub mod core;
pub mod outing;
pub mod selection;
pub mod setup;
pub mod students;
