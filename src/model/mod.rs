mod texture;
mod material;
mod mesh;
mod vertex;
mod loader;

pub use texture::{DecodedImage, ImageDecoder, ImageFileDecoder, Texture};
pub use material::MaterialRef;
pub use mesh::Mesh;
pub use vertex::Vertex;
pub use loader::{load_obj, parse_obj, MeshOptions, ObjModel, SceneAssets};
