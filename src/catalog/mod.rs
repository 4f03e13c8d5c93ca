//! Static shader-definition catalog
//!
//! The target engine ships a fixed set of shader presets. Each preset
//! declares the texture sampler slots and vector parameters the scene
//! document must emit, in a fixed order that the downstream compiler
//! depends on. The catalog is built once and never mutated; callers
//! inject it into the serializer rather than reaching for ambient state.

use indexmap::IndexMap;

/// A named texture parameter declared by a shader.
///
/// `name` is the parameter identifier emitted in the document;
/// `slot` is the sampler slot it binds (the key material configurations
/// assign textures under).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureParam {
    pub name: String,
    pub slot: String,
}

/// A named 4-component vector parameter with its catalog default.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorParam {
    pub name: String,
    pub default: [f32; 4],
}

/// A single shader preset.
///
/// Parameter declaration order is part of the output contract: the
/// serializer emits texture and vector parameters in exactly this order.
#[derive(Debug, Clone)]
pub struct ShaderDef {
    /// Filename identifier, used as the catalog key and emitted verbatim.
    pub filename: String,
    /// Human-readable name for UI display.
    pub display_name: String,
    /// Draw-order hint consumed by the external renderer.
    pub render_bucket: i32,
    /// Texture parameters, in declaration order.
    pub textures: Vec<TextureParam>,
    /// Vector parameters, in declaration order.
    pub vectors: Vec<VectorParam>,
    /// Whether the vertex layout must carry a tangent attribute.
    pub needs_tangent: bool,
}

impl ShaderDef {
    /// Iterate the sampler slot names this shader binds, in declaration order.
    pub fn sampler_slots(&self) -> impl Iterator<Item = &str> {
        self.textures.iter().map(|t| t.slot.as_str())
    }
}

/// Read-only lookup table of shader presets, keyed by filename.
#[derive(Debug, Clone)]
pub struct ShaderCatalog {
    shaders: IndexMap<String, ShaderDef>,
}

impl ShaderCatalog {
    /// Build a catalog from a list of definitions.
    ///
    /// Insertion order is preserved for iteration.
    #[must_use]
    pub fn new(defs: Vec<ShaderDef>) -> Self {
        let shaders = defs
            .into_iter()
            .map(|def| (def.filename.clone(), def))
            .collect();
        Self { shaders }
    }

    /// Look up a shader by filename.
    #[must_use]
    pub fn get(&self, filename: &str) -> Option<&ShaderDef> {
        self.shaders.get(filename)
    }

    /// The shader new material configurations start with.
    ///
    /// # Panics
    /// Panics if the catalog is empty; `builtin()` never is.
    #[must_use]
    pub fn default_shader(&self) -> &ShaderDef {
        self.shaders
            .first()
            .map(|(_, def)| def)
            .expect("catalog must not be empty")
    }

    /// Iterate all shaders in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &ShaderDef> {
        self.shaders.values()
    }

    /// Number of shaders in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    /// The built-in preset set shipped with the target engine.
    #[must_use]
    pub fn builtin() -> Self {
        fn tex(name: &str, slot: &str) -> TextureParam {
            TextureParam {
                name: name.to_string(),
                slot: slot.to_string(),
            }
        }
        fn vec4(name: &str, default: [f32; 4]) -> VectorParam {
            VectorParam {
                name: name.to_string(),
                default,
            }
        }

        Self::new(vec![
            ShaderDef {
                filename: "simple.fx".to_string(),
                display_name: "Simple".to_string(),
                render_bucket: 0,
                textures: vec![tex("baseTexture", "baseMap")],
                vectors: vec![
                    vec4("materialDiffuse", [1.0, 1.0, 1.0, 1.0]),
                    vec4("materialAmbient", [0.5, 0.5, 0.5, 1.0]),
                ],
                needs_tangent: false,
            },
            ShaderDef {
                filename: "simplealpha.fx".to_string(),
                display_name: "Simple (alpha tested)".to_string(),
                render_bucket: 2,
                textures: vec![tex("baseTexture", "baseMap")],
                vectors: vec![
                    vec4("materialDiffuse", [1.0, 1.0, 1.0, 1.0]),
                    vec4("alphaTestRef", [0.5, 0.0, 0.0, 0.0]),
                ],
                needs_tangent: false,
            },
            ShaderDef {
                filename: "detail.fx".to_string(),
                display_name: "Detail mapped".to_string(),
                render_bucket: 0,
                textures: vec![
                    tex("baseTexture", "baseMap"),
                    tex("detailTexture", "detailMap"),
                ],
                vectors: vec![
                    vec4("materialDiffuse", [1.0, 1.0, 1.0, 1.0]),
                    vec4("detailScale", [4.0, 4.0, 0.0, 0.0]),
                ],
                needs_tangent: false,
            },
            ShaderDef {
                filename: "bumpspec.fx".to_string(),
                display_name: "Bumped specular".to_string(),
                render_bucket: 0,
                textures: vec![
                    tex("baseTexture", "baseMap"),
                    tex("normalTexture", "normalMap"),
                    tex("specularTexture", "specularMap"),
                ],
                vectors: vec![
                    vec4("materialDiffuse", [1.0, 1.0, 1.0, 1.0]),
                    vec4("materialSpecular", [1.0, 1.0, 1.0, 32.0]),
                ],
                needs_tangent: true,
            },
            ShaderDef {
                filename: "emissive.fx".to_string(),
                display_name: "Emissive".to_string(),
                render_bucket: 1,
                textures: vec![
                    tex("baseTexture", "baseMap"),
                    tex("glowTexture", "glowMap"),
                ],
                vectors: vec![
                    vec4("materialDiffuse", [1.0, 1.0, 1.0, 1.0]),
                    vec4("emissiveColor", [1.0, 1.0, 1.0, 1.0]),
                ],
                needs_tangent: false,
            },
        ])
    }
}
