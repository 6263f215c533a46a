pub mod image_sequence_reader;
pub mod synthetic_frame_source;
