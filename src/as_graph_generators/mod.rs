pub mod caida;
pub mod synthetic;

use crate::as_graph::{ASGraph, BuildReport};
use crate::shared::DatasetError;

pub use caida::{graph_from_caida_reader, parse_caida_line, CAIDAASGraphGenerator};
pub use synthetic::SyntheticGraphGenerator;

/// Source of an [`ASGraph`]. Malformed input is reported in the
/// [`BuildReport`]; only failures to read the source at all are errors.
pub trait ASGraphGenerator {
    fn generate(&self) -> Result<(ASGraph, BuildReport), DatasetError>;
}
