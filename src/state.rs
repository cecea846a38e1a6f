pub mod animation;
pub mod events;
pub mod playback;
