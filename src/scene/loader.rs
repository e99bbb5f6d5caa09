use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use glam::{Vec2, Vec3};
use thiserror::Error;
use walkdir::WalkDir;

use crate::renderer::programs::Programs;
use crate::renderer::texture::{Sampling, Texture, TextureError};
use crate::renderer::vertex_array::{
    GeometryError, VertexAttribute, ATTR_LOC_COLOR_OR_NORMAL, ATTR_LOC_POSITION,
    ATTR_LOC_TEXCOORD,
};
use crate::scene::mesh::{Light, Mesh, PhongMaterial, PhongMesh, TexturedMesh};
use crate::scene::Drawable;

/// How imported sub-meshes are turned into drawables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shading {
    /// Color program, with the normals standing in for vertex colors.
    Flat,
    /// Phong program with the material's coefficients.
    Phong,
    /// Texture program; every sub-mesh needs UVs and a diffuse texture.
    Textured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    pub shading: Shading,
    pub flip_uv: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            shading: Shading::Phong,
            flip_uv: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("could not load {path}")]
    Load {
        path: String,
        #[source]
        source: tobj::LoadError,
    },
    #[error("mesh \"{mesh}\" has no diffuse texture in its material")]
    MissingTexture { mesh: String },
    #[error("mesh \"{mesh}\" has no texture coordinates")]
    MissingTexCoords { mesh: String },
    #[error("texture \"{name}\" of mesh \"{mesh}\" not found under {dir}")]
    UnresolvedTexture {
        mesh: String,
        name: String,
        dir: String,
    },
    #[error("mesh \"{mesh}\" has invalid geometry")]
    Geometry {
        mesh: String,
        #[source]
        source: GeometryError,
    },
    #[error("mesh \"{mesh}\" could not get its texture")]
    Texture {
        mesh: String,
        #[source]
        source: TextureError,
    },
}

/// One imported sub-mesh, with everything needed to build its drawable.
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tex_coords: Vec<Vec2>,
    pub index: Vec<u32>,
    pub material: PhongMaterial,
    pub texture: Option<PathBuf>,
}

impl SubMesh {
    pub fn face_count(&self) -> usize {
        self.index.len() / 3
    }
}

/// The outcome of translating one file: the sub-meshes that can be drawn and
/// the reasons the others cannot.
#[derive(Debug, Default)]
pub struct Translation {
    pub meshes: Vec<SubMesh>,
    pub failures: Vec<ImportError>,
    pub face_count: usize,
}

/// Turns loaded OBJ models into sub-meshes. Textures named by materials are
/// resolved relative to `base_dir`.
pub fn translate(
    models: &[tobj::Model],
    materials: &[tobj::Material],
    base_dir: &Path,
    options: &ImportOptions,
) -> Translation {
    let mut translation = Translation::default();
    for model in models {
        let mesh = &model.mesh;
        translation.face_count += mesh.indices.len() / 3;
        match translate_mesh(&model.name, mesh, materials, base_dir, options) {
            Ok(sub_mesh) => translation.meshes.push(sub_mesh),
            Err(err) => translation.failures.push(err),
        }
    }
    translation
}

fn translate_mesh(
    name: &str,
    mesh: &tobj::Mesh,
    materials: &[tobj::Material],
    base_dir: &Path,
    options: &ImportOptions,
) -> Result<SubMesh, ImportError> {
    let positions: Vec<Vec3> = mesh.positions.chunks_exact(3).map(Vec3::from_slice).collect();
    let normals = if mesh.normals.len() == mesh.positions.len() {
        mesh.normals.chunks_exact(3).map(Vec3::from_slice).collect()
    } else {
        smooth_normals(&positions, &mesh.indices)
    };
    let tex_coords: Vec<Vec2> = mesh
        .texcoords
        .chunks_exact(2)
        .map(|uv| {
            let v = if options.flip_uv { 1.0 - uv[1] } else { uv[1] };
            Vec2::new(uv[0], v)
        })
        .collect();

    let material = mesh.material_id.and_then(|id| materials.get(id));
    let phong = material.map(phong_material).unwrap_or(PhongMaterial {
        k_d: Vec3::ONE,
        ..PhongMaterial::default()
    });

    let mut texture = None;
    if options.shading == Shading::Textured {
        let texture_name = material
            .and_then(|m| m.diffuse_texture.as_deref())
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ImportError::MissingTexture {
                mesh: name.to_string(),
            })?;
        if tex_coords.is_empty() {
            return Err(ImportError::MissingTexCoords {
                mesh: name.to_string(),
            });
        }
        let path = find_texture(base_dir, texture_name).ok_or_else(|| {
            ImportError::UnresolvedTexture {
                mesh: name.to_string(),
                name: texture_name.to_string(),
                dir: base_dir.display().to_string(),
            }
        })?;
        texture = Some(path);
    }

    Ok(SubMesh {
        name: name.to_string(),
        positions,
        normals,
        tex_coords,
        index: mesh.indices.clone(),
        material: phong,
        texture,
    })
}

fn phong_material(material: &tobj::Material) -> PhongMaterial {
    PhongMaterial {
        k_a: material.ambient.map(Vec3::from).unwrap_or(Vec3::ZERO),
        k_d: material.diffuse.map(Vec3::from).unwrap_or(Vec3::ONE),
        k_s: material.specular.map(Vec3::from).unwrap_or(Vec3::ONE),
        s: material.shininess.unwrap_or(16.0),
    }
}

/// Per-vertex normals averaged from the adjacent faces, weighted by their
/// area. Vertices not used by any face get a zero normal.
pub fn smooth_normals(positions: &[Vec3], index: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for face in index.chunks_exact(3) {
        let [a, b, c] = [face[0], face[1], face[2]].map(|i| i as usize);
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let face_normal = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face_normal;
        normals[b] += face_normal;
        normals[c] += face_normal;
    }
    normals.iter().map(|n| n.normalize_or_zero()).collect()
}

/// Looks for the texture a material names. Exporters write these with
/// backslashes, absolute paths from another machine or the wrong case, so
/// after trying the name as a relative path, any file under `base_dir` with
/// the same file name (ignoring case) is accepted.
pub fn find_texture(base_dir: &Path, name: &str) -> Option<PathBuf> {
    let normalized = name.trim().replace('\\', "/");
    let direct = base_dir.join(normalized.trim_start_matches('/'));
    if direct.is_file() {
        return Some(direct);
    }
    let file_name = normalized.rsplit('/').next()?.to_lowercase();
    if file_name.is_empty() {
        return None;
    }
    WalkDir::new(base_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .find(|entry| entry.file_name().to_string_lossy().to_lowercase() == file_name)
        .map(|entry| entry.into_path())
}

/// Loads every sub-mesh of `path` as a drawable. Failures are logged and the
/// affected sub-meshes left out; a file that cannot be read yields nothing.
pub fn load(
    path: &Path,
    options: &ImportOptions,
    programs: &Programs,
    light: &Rc<Light>,
) -> Vec<Rc<dyn Drawable>> {
    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, materials) = match tobj::load_obj(path, &load_options) {
        Ok(loaded) => loaded,
        Err(source) => {
            let err = ImportError::Load {
                path: path.display().to_string(),
                source,
            };
            log::error!("{:#}", anyhow::Error::new(err));
            return Vec::new();
        }
    };
    let materials = materials.unwrap_or_else(|err| {
        log::warn!("no materials for {}: {err}", path.display());
        Vec::new()
    });

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let translation = translate(&models, &materials, base_dir, options);
    let mut failures = translation.failures;
    let mut textures: HashMap<PathBuf, Rc<Texture>> = HashMap::new();
    let mut drawables = Vec::with_capacity(translation.meshes.len());
    for sub_mesh in &translation.meshes {
        match build_drawable(sub_mesh, options, programs, light, &mut textures) {
            Ok(drawable) => drawables.push(drawable),
            Err(err) => failures.push(err),
        }
    }

    for failure in failures {
        log::error!("{}: {:#}", path.display(), anyhow::Error::new(failure));
    }
    log::info!(
        "Loaded {}\t({} meshes, {} faces)",
        path.display(),
        drawables.len(),
        translation.face_count,
    );
    drawables
}

/// Uploads one sub-mesh. Textures are shared between sub-meshes naming the
/// same file.
fn build_drawable(
    sub_mesh: &SubMesh,
    options: &ImportOptions,
    programs: &Programs,
    light: &Rc<Light>,
    textures: &mut HashMap<PathBuf, Rc<Texture>>,
) -> Result<Rc<dyn Drawable>, ImportError> {
    let geometry_error = |source| ImportError::Geometry {
        mesh: sub_mesh.name.clone(),
        source,
    };
    let positions = VertexAttribute::vec3(ATTR_LOC_POSITION, &sub_mesh.positions);
    let normals = VertexAttribute::vec3(ATTR_LOC_COLOR_OR_NORMAL, &sub_mesh.normals);
    let index = Some(sub_mesh.index.as_slice());

    let drawable: Rc<dyn Drawable> = match options.shading {
        Shading::Flat => Rc::new(
            Mesh::new(programs.color.clone(), &[positions, normals], index)
                .map_err(geometry_error)?,
        ),
        Shading::Phong => {
            let mesh = Mesh::new(programs.phong.clone(), &[positions, normals], index)
                .map_err(geometry_error)?;
            Rc::new(PhongMesh::new(mesh, sub_mesh.material, light.clone()))
        }
        Shading::Textured => {
            let path = sub_mesh
                .texture
                .as_ref()
                .ok_or_else(|| ImportError::MissingTexture {
                    mesh: sub_mesh.name.clone(),
                })?;
            let texture = match textures.get(path) {
                Some(texture) => texture.clone(),
                None => {
                    let texture = Texture::load(path, Sampling::default()).map_err(|source| {
                        ImportError::Texture {
                            mesh: sub_mesh.name.clone(),
                            source,
                        }
                    })?;
                    let texture = Rc::new(texture);
                    textures.insert(path.clone(), texture.clone());
                    texture
                }
            };
            let tex_coords = VertexAttribute::vec2(ATTR_LOC_TEXCOORD, &sub_mesh.tex_coords);
            let mesh = Mesh::new(programs.texture.clone(), &[positions, tex_coords], index)
                .map_err(geometry_error)?;
            Rc::new(TexturedMesh::new(mesh, texture))
        }
    };
    Ok(drawable)
}
