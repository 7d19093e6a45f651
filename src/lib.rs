pub mod common;
pub mod config;
pub mod db;
pub mod funnel;
pub mod models;
pub mod services;
pub mod types;
pub mod web;
