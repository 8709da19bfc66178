//! Tax computation: GST, CESS, and TDS/TCS withholding

pub mod gst;
pub mod summary;

pub use gst::*;
pub use summary::*;
