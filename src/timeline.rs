pub mod layer_track;
pub mod stage;
pub mod subroutine;
pub mod zorder;
