//! Naming of the embedding dump.
//!
//! The embedding is dumped in bson (see [crate::io::embeddedbson]), the dump name always ends with .bson.

use std::path::Path;

const BSON_EXTENSION: &str = ".bson";

const DEFAULT_OUTPUT_NAME: &str = "embedding.bson";

#[derive(Clone, Debug)]
pub struct Output {
    output_name: String,
} // end of struct Output

impl Output {
    /// the dump is name.bson, or embedding.bson without name. A name already ending with .bson is kept.
    pub fn new(name: Option<&str>) -> Self {
        let output_name = match name {
            Some(name) if name.ends_with(BSON_EXTENSION) => String::from(name),
            Some(name) => format!("{}{}", name, BSON_EXTENSION),
            None => String::from(DEFAULT_OUTPUT_NAME),
        };
        Output { output_name }
    }

    pub fn get_output_name(&self) -> &str {
        &self.output_name
    }

    pub fn get_path(&self) -> &Path {
        Path::new(&self.output_name)
    }
} // end of impl Output

impl Default for Output {
    fn default() -> Self {
        Output::new(None)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_output_names() {
        assert_eq!(Output::default().get_output_name(), "embedding.bson");
        assert_eq!(Output::new(Some("run1")).get_output_name(), "run1.bson");
        assert_eq!(Output::new(Some("dir/run1.bson")).get_path(), Path::new("dir/run1.bson"));
    }
} // end of mod tests
