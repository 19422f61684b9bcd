use std::fs;
use std::path::{Path, PathBuf};

use crate::resources::ResourceMap;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Serializing resources failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Writing {path} failed: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Compact JSON with no trailing newline, replacing any existing file.
pub fn write_json(path: &Path, resources: &ResourceMap) -> Result<(), Error> {
    let file_contents = serde_json::to_string(resources)?;
    return write_file(path, file_contents);
}

pub fn write_typings(path: &Path, resources: &ResourceMap) -> Result<(), Error> {
    return write_file(path, typings_contents(resources));
}

/// Declares each logical id as an environment variable of the Node.js process.
fn typings_contents(resources: &ResourceMap) -> String {
    let entries = resources
        .keys()
        .fold(String::from(""), |mut acc, logical_id| {
            let type_entry = format!("    {}: string;\n", logical_id);

            acc.push_str(&type_entry);
            return acc;
        });

    return format!(
        "declare namespace NodeJS {{\n  interface ProcessEnv {{\n{}  }}\n}}\n",
        entries
    );
}

fn write_file(path: &Path, contents: String) -> Result<(), Error> {
    return fs::write(path, contents).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    });
}
