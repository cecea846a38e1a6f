pub mod decode;
/// Reel resolution for sub-routines.
pub mod reel;
