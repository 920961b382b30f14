use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::LoadError;
use super::{DecodedImage, ImageDecoder, MaterialRef, Mesh, Vertex};

/// Values applied to every vertex at load time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshOptions {
    pub color: [f32; 4],
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// Result of parsing a model file: the expanded mesh plus the material file
/// named by `mtllib`, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjModel {
    pub mesh: Mesh,
    pub material_library: Option<String>,
}

/// Attribute tables accumulated while walking the file. Faces only ever see
/// the entries defined above them.
struct ObjData<'a> {
    path: &'a Path,
    options: MeshOptions,
    positions: Vec<[f32; 3]>,
    tex_coords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
    material_library: Option<String>,
    mesh: Mesh,
}

impl<'a> ObjData<'a> {
    fn new(path: &'a Path, options: MeshOptions) -> Self {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();

        Self {
            path,
            options,
            positions: Vec::new(),
            tex_coords: Vec::new(),
            normals: Vec::new(),
            material_library: None,
            mesh: Mesh::new(name),
        }
    }

    fn parse_error(&self, line: usize, message: impl Into<String>) -> LoadError {
        LoadError::Parse {
            path: self.path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    fn floats<const N: usize>(&self, line: usize, directive: &str, tokens: &[&str]) -> Result<[f32; N], LoadError> {
        if tokens.len() < N {
            return Err(self.parse_error(
                line,
                format!("'{directive}' expects {N} values, found {}", tokens.len()),
            ));
        }

        let mut out = [0.0; N];
        for (slot, token) in out.iter_mut().zip(tokens) {
            *slot = token
                .parse::<f32>()
                .map_err(|_| self.parse_error(line, format!("invalid number '{token}' in '{directive}'")))?;
        }
        Ok(out)
    }

    fn process_line(&mut self, number: usize, line: &str) -> Result<(), LoadError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&directive, args)) = tokens.split_first() else {
            return Ok(());
        };

        match directive {
            // Right-handed source: negate x and z for the left-handed renderer space.
            "v" => {
                let [x, y, z] = self.floats::<3>(number, directive, args)?;
                self.positions.push([-x, y, -z]);
            }
            "vt" => {
                let [u, v] = self.floats::<2>(number, directive, args)?;
                self.tex_coords.push([u, -v]);
            }
            "vn" => {
                let [x, y, z] = self.floats::<3>(number, directive, args)?;
                self.normals.push([-x, y, z]);
            }
            "f" => self.process_face(number, args)?,
            "mtllib" => {
                if args.is_empty() {
                    return Err(self.parse_error(number, "'mtllib' without a file name"));
                }
                self.material_library = Some(args.join(" "));
            }
            d if d.starts_with('#') => {}
            other => log::trace!("{}:{}: skipping '{}'", self.path.display(), number, other),
        }

        Ok(())
    }

    fn process_face(&mut self, line: usize, corners: &[&str]) -> Result<(), LoadError> {
        if corners.len() != 3 {
            return Err(LoadError::NonTriangularFace {
                path: self.path.to_path_buf(),
                line,
                corners: corners.len(),
            });
        }

        let mut triangle = [Vertex {
            position: [0.0; 3],
            normal: [0.0; 3],
            color: self.options.color,
            tex_coords: [0.0; 2],
        }; 3];

        for (vertex, corner) in triangle.iter_mut().zip(corners) {
            let refs: Vec<&str> = corner.split('/').collect();
            if refs.len() != 3 || refs.iter().any(|r| r.is_empty()) {
                return Err(self.parse_error(
                    line,
                    format!("face corner '{corner}' must be position/uv/normal"),
                ));
            }

            let position = self.resolve(line, "position", refs[0], self.positions.len())?;
            let uv = self.resolve(line, "texture coordinate", refs[1], self.tex_coords.len())?;
            let normal = self.resolve(line, "normal", refs[2], self.normals.len())?;

            vertex.position = self.positions[position];
            vertex.tex_coords = self.tex_coords[uv];
            vertex.normal = self.normals[normal];
        }

        self.mesh.push_triangle(triangle);
        Ok(())
    }

    /// Maps a 1-based (or negative, relative) index onto the table length seen so far.
    fn resolve(&self, line: usize, kind: &'static str, token: &str, len: usize) -> Result<usize, LoadError> {
        let index = token
            .parse::<i64>()
            .map_err(|_| self.parse_error(line, format!("invalid {kind} index '{token}'")))?;

        let resolved = match index {
            i if i > 0 => i - 1,
            i if i < 0 => len as i64 + i,
            _ => -1,
        };

        if resolved < 0 || resolved >= len as i64 {
            return Err(LoadError::IndexOutOfRange {
                path: self.path.to_path_buf(),
                line,
                kind,
                index,
                len,
            });
        }

        Ok(resolved as usize)
    }
}

/// Parses model text from any reader. `path` is only used for error messages
/// and the mesh name.
pub fn parse_obj<R: BufRead>(reader: R, path: &Path, options: MeshOptions) -> Result<ObjModel, LoadError> {
    let mut data = ObjData::new(path, options);

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        data.process_line(index + 1, &line)?;
    }

    log::debug!(
        "{}: {} positions, {} uvs, {} normals, {} vertices",
        path.display(),
        data.positions.len(),
        data.tex_coords.len(),
        data.normals.len(),
        data.mesh.vertex_count(),
    );

    Ok(ObjModel {
        mesh: data.mesh,
        material_library: data.material_library,
    })
}

pub fn load_obj(path: &Path, options: MeshOptions) -> Result<ObjModel, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_obj(BufReader::new(file), path, options)
}

/// Mesh, material and decoded diffuse texture for the one model on screen.
/// Either everything loads or nothing is returned.
#[derive(Debug, Clone)]
pub struct SceneAssets {
    pub mesh: Mesh,
    pub material: MaterialRef,
    pub texture: DecodedImage,
}

impl SceneAssets {
    pub fn load<D: ImageDecoder>(path: &Path, options: MeshOptions, decoder: &D) -> Result<Self, LoadError> {
        let model = load_obj(path, options)?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let material_path = material_path(path, &base_dir, model.material_library.as_deref());
        let material = MaterialRef::load(&material_path, &base_dir)?;
        let texture = decoder.decode(&material.diffuse_texture)?;

        log::info!(
            "Loaded {}: {} vertices, texture {} ({}x{})",
            path.display(),
            model.mesh.vertex_count(),
            material.diffuse_texture.display(),
            texture.width,
            texture.height,
        );

        Ok(Self {
            mesh: model.mesh,
            material,
            texture,
        })
    }
}

/// `mtllib` when the model names one, otherwise the model path with `.mtl`.
fn material_path(model: &Path, base_dir: &Path, library: Option<&str>) -> PathBuf {
    match library {
        Some(name) => base_dir.join(name),
        None => model.with_extension("mtl"),
    }
}
