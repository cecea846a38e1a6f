/// Per-sub-routine motion channels keyed at normalized time.
pub mod channel;
pub mod ease;
/// Frame-keyed, step-held snapshot tracks.
pub mod keyframes;
