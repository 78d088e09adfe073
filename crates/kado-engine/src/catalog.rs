//! The seed catalog: bundled with the crate, or read from a configured file.

use std::path::Path;

use kado_core::{
  Error as CoreError,
  import::{self, Candidate},
  item::Item,
};

use crate::{Error, Result};

/// The catalog compiled into the binary.
const BUILTIN: &str = include_str!("../data/catalog.json");

/// The bundled seed catalog.
pub fn builtin() -> Result<Vec<Item>> { parse(BUILTIN) }

/// Read a seed catalog from a JSON file in the bulk import shape.
pub fn from_file(path: &Path) -> Result<Vec<Item>> {
  let raw = std::fs::read_to_string(path)
    .map_err(|source| Error::Catalog { path: path.to_path_buf(), source })?;
  parse(&raw)
}

/// A seed catalog must be entirely well-formed: unlike an interactive bulk
/// import, a single bad record rejects the whole catalog.
fn parse(raw: &str) -> Result<Vec<Item>> {
  import::parse_payload(raw)?
    .into_iter()
    .map(|candidate| match candidate {
      Candidate::Valid(item) => Ok(item),
      Candidate::Malformed { index, reason, .. } => Err(Error::Core(
        CoreError::MalformedInput(format!("catalog record {index}: {reason}")),
      )),
    })
    .collect()
}
