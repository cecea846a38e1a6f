pub mod collection;
pub mod track;
/// Background waveform decoding.
pub mod waveform;
