//! Font source data: UFO bookkeeping files and norad conversions

pub mod conversions;
pub mod ufo;
