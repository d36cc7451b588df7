pub mod apply;
pub mod auth;
pub mod destroy;
pub mod refresh;
pub mod show;
