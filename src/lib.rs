//! AI PhotoStudio: template-driven image generation with a desktop UI and
//! a headless CLI.

pub mod app;
pub mod cli;
pub mod components;
pub mod io;
pub mod logger;
pub mod mode;
pub mod ops;
pub mod session;
pub mod settings;
