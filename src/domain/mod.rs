pub mod event;
pub mod lane;
pub mod motion;
pub mod player;
pub mod rules;
pub mod vehicle;
