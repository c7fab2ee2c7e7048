//! PDF input and output.

mod reader;
mod writer;

pub use reader::{LoadedPdf, PdfReader};
pub use writer::{PdfWriter, StagedOutput};
