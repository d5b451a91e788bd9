pub mod app_config;
pub mod db;
pub mod file;
pub mod help;
pub mod middleware;
pub mod orm;
pub mod role;
pub mod session;
pub mod storage;
pub mod web;
