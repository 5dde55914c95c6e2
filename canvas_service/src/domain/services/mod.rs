pub mod coordinates_assigner;
pub mod gravity;
pub mod helpers;
pub mod room_sequencer;
pub mod similarity;
