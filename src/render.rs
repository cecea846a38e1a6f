pub mod blend;
pub mod compositor;
pub mod sample;
pub mod surface;
