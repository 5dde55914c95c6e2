pub mod events;
pub mod gravity_loop;
pub mod room_registry;
pub mod session;
