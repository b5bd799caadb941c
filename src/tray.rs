pub mod commands;
pub mod common;
pub mod editor;
pub mod menu;
pub mod model;
pub mod startup;
pub mod terminal;
