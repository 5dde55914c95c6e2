pub mod compute_similarities;
pub mod create_card;
pub mod generate_components;
pub mod load_canvas;
pub mod relax_room;
pub mod search_magnet;

#[cfg(test)]
pub(crate) mod fakes;
