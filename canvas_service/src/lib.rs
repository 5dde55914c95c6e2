pub mod adapters;
pub mod configuration;
pub mod domain;
pub mod ports;
pub mod realtime;
pub mod repositories;
pub mod routes;
pub mod startup;
