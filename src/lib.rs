pub mod app;
pub mod authorize;
pub mod config;
pub mod directory;
pub mod grants;
pub mod naming;
pub mod profile;
pub mod progress;
pub mod prompt;
pub mod run;
pub mod template;
