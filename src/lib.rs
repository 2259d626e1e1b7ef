// src/lib.rs

pub mod clients;
pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod proto;
pub mod routes;
pub mod rpc;
pub mod services;
