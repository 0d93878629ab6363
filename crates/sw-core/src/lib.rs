pub mod model;
pub mod parser;
pub mod path;

pub use model::*;
pub use parser::{ParseError, parse_design_response};
pub use path::{VectorPath, WindingRule, extract_svg_paths, validate_path_data};
