pub mod clients;
pub mod config;
pub mod db;
pub mod design;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod money;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
