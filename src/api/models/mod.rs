pub mod analysis;
pub mod preview;
