//! YAML table definitions: a row type plus its default format options.
//!
//! ```yaml
//! fields:
//!   - name: id
//!     type: integer
//!     nullable: false
//!   - name: tags
//!     type: { array: string }
//! options:
//!   fieldDelimiter: "\\t"
//!   nullLiteral: NA
//! ```

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{options::FormatOptions, types::RowType};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub fields: RowType,
    #[serde(default)]
    pub options: FormatOptions,
}

impl TableDefinition {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
        let definition = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing schema YAML {path:?}"))?;
        Ok(definition)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating schema file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing schema YAML")
    }
}
