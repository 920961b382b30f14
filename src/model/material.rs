use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LoadError;

/// The single diffuse texture a model refers to, already resolved against
/// the model file's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialRef {
    pub name: String,
    pub diffuse_texture: PathBuf,
}

impl MaterialRef {
    /// Reads a material file and resolves its `map_Kd` against `base_dir`.
    /// All other directives are ignored; the last `map_Kd` wins.
    pub fn load(path: &Path, base_dir: &Path) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut name = String::new();
        let mut diffuse = None;

        for (number, line) in text.lines().enumerate() {
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("newmtl") => {
                    name = tokens.collect::<Vec<_>>().join(" ");
                }
                Some("map_Kd") => {
                    // File names may contain spaces; options such as -s are not supported.
                    let file = tokens.collect::<Vec<_>>().join(" ");
                    if file.is_empty() {
                        return Err(LoadError::Parse {
                            path: path.to_path_buf(),
                            line: number + 1,
                            message: "map_Kd without a file name".to_string(),
                        });
                    }
                    diffuse = Some(file);
                }
                _ => {}
            }
        }

        let file = diffuse.ok_or_else(|| LoadError::MissingDiffuseMap {
            path: path.to_path_buf(),
        })?;

        Ok(Self {
            name,
            diffuse_texture: base_dir.join(file),
        })
    }
}
