mod canvas;
mod create_card;
mod generate;
mod health_check;
mod helpers;
mod magnet;
mod realtime;
mod similarities;
