pub mod app;
pub mod auth;
pub mod banner;
pub mod commands;
pub mod consts;
pub mod detect;
pub mod explain;
pub mod flow;
pub mod logging;
pub mod markdown;
pub mod spinner;
pub mod view;
