// src/db/mod.rs

pub mod connection;
pub mod migrations;

pub use connection::{
    create_connection_pool, create_pool_at, get_database_path, ConnectionPool, PooledConn,
};
pub use migrations::initialize_database;
