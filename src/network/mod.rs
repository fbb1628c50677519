pub mod http_models;
pub mod http_server;
