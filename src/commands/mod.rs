pub mod build;
pub mod clean;
pub mod deps;
pub mod install;
pub mod run;
pub mod ui_build;
