mod canvas;
mod create_card;
mod generate;
mod health_check;
mod magnet;
mod realtime_ws;
mod similarities;

pub use canvas::*;
pub use create_card::*;
pub use generate::*;
pub use health_check::*;
pub use magnet::*;
pub use realtime_ws::*;
pub use similarities::*;
