//! XML emission for the scene document

use glam::Vec3;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::format::{color_byte, format_f32};
use super::{LOD_DISTANCE, LOD_FLAGS, compute_bounds};
use crate::catalog::{ShaderCatalog, ShaderDef};
use crate::error::{Error, Result};
use crate::model::{MaterialConfig, Mesh, Model, TextureEntry};

/// Indices per line in the index block. Grouping is purely for document
/// readability; the decoded sequence is unaffected.
const INDICES_PER_LINE: usize = 12;

pub fn serialize(
    model: &Model,
    materials: &[MaterialConfig],
    textures: &[TextureEntry],
    catalog: &ShaderCatalog,
) -> Result<String> {
    let mut output = Vec::new();
    let mut writer = Writer::new_with_indent(&mut output, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut root = BytesStart::new("model");
    root.push_attribute(("name", model.name.as_str()));
    writer.write_event(Event::Start(root))?;

    write_header(&mut writer, model)?;
    write_texture_dictionary(&mut writer, textures)?;
    write_shaders(&mut writer, model, materials, textures, catalog)?;
    write_drawable_model(&mut writer, model, materials, catalog)?;

    writer.write_event(Event::End(BytesEnd::new("model")))?;

    Ok(String::from_utf8(output)?)
}

/// Global metadata: bounding sphere, bounding box, LOD constants.
fn write_header<W: std::io::Write>(writer: &mut Writer<W>, model: &Model) -> Result<()> {
    let bounds = compute_bounds(model);

    let mut sphere = BytesStart::new("boundingSphere");
    sphere.push_attribute(("centerX", format_f32(bounds.center.x).as_str()));
    sphere.push_attribute(("centerY", format_f32(bounds.center.y).as_str()));
    sphere.push_attribute(("centerZ", format_f32(bounds.center.z).as_str()));
    sphere.push_attribute(("radius", format_f32(bounds.radius).as_str()));
    writer.write_event(Event::Empty(sphere))?;

    let mut bbox = BytesStart::new("boundingBox");
    bbox.push_attribute(("minX", format_f32(bounds.min.x).as_str()));
    bbox.push_attribute(("minY", format_f32(bounds.min.y).as_str()));
    bbox.push_attribute(("minZ", format_f32(bounds.min.z).as_str()));
    bbox.push_attribute(("maxX", format_f32(bounds.max.x).as_str()));
    bbox.push_attribute(("maxY", format_f32(bounds.max.y).as_str()));
    bbox.push_attribute(("maxZ", format_f32(bounds.max.z).as_str()));
    writer.write_event(Event::Empty(bbox))?;

    let mut lod = BytesStart::new("lod");
    lod.push_attribute(("distance", format_f32(LOD_DISTANCE).as_str()));
    lod.push_attribute(("flags", LOD_FLAGS.to_string().as_str()));
    writer.write_event(Event::Empty(lod))?;

    Ok(())
}

/// Texture dictionary: one entry per unique (name, slot) pair, in
/// first-appearance order.
fn write_texture_dictionary<W: std::io::Write>(
    writer: &mut Writer<W>,
    textures: &[TextureEntry],
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("textures")))?;

    let mut seen: Vec<(&str, &str)> = Vec::new();
    for entry in textures {
        let key = (entry.name.as_str(), entry.slot.as_str());
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);

        let mut tag = BytesStart::new("texture");
        tag.push_attribute(("name", entry.name.as_str()));
        tag.push_attribute(("slot", entry.slot.as_str()));
        tag.push_attribute(("file", entry.file_name.as_str()));
        tag.push_attribute(("width", entry.width.to_string().as_str()));
        tag.push_attribute(("height", entry.height.to_string().as_str()));
        tag.push_attribute(("format", entry.format.four_cc()));
        writer.write_event(Event::Empty(tag))?;
    }

    writer.write_event(Event::End(BytesEnd::new("textures")))?;
    Ok(())
}

/// Shader list: one entry per material configuration, in model material
/// order. Parameters follow the shader definition's declared order.
fn write_shaders<W: std::io::Write>(
    writer: &mut Writer<W>,
    model: &Model,
    materials: &[MaterialConfig],
    textures: &[TextureEntry],
    catalog: &ShaderCatalog,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("shaders")))?;

    for name in &model.material_names {
        let config = materials.iter().find(|m| &m.name == name);
        let shader = resolve_shader(config, catalog)?;

        let mut tag = BytesStart::new("shader");
        tag.push_attribute(("name", name.as_str()));
        tag.push_attribute(("file", shader.filename.as_str()));
        tag.push_attribute(("bucket", shader.render_bucket.to_string().as_str()));
        writer.write_event(Event::Start(tag))?;

        for param in &shader.textures {
            let entry = config.and_then(|c| resolve_texture(c, &param.slot, textures));

            let mut param_tag = BytesStart::new("textureParam");
            param_tag.push_attribute(("param", param.name.as_str()));
            match entry {
                Some(entry) => {
                    param_tag.push_attribute(("name", entry.name.as_str()));
                    param_tag.push_attribute(("file", entry.file_name.as_str()));
                }
                None => {
                    // Unassigned slot: empty placeholder entry.
                    param_tag.push_attribute(("name", ""));
                    param_tag.push_attribute(("file", ""));
                }
            }
            writer.write_event(Event::Empty(param_tag))?;
        }

        for param in &shader.vectors {
            let value = param
                .default
                .iter()
                .map(|&v| format_f32(v))
                .collect::<Vec<_>>()
                .join(" ");

            let mut param_tag = BytesStart::new("vectorParam");
            param_tag.push_attribute(("param", param.name.as_str()));
            param_tag.push_attribute(("value", value.as_str()));
            writer.write_event(Event::Empty(param_tag))?;
        }

        writer.write_event(Event::End(BytesEnd::new("shader")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("shaders")))?;
    Ok(())
}

fn resolve_shader<'a>(
    config: Option<&MaterialConfig>,
    catalog: &'a ShaderCatalog,
) -> Result<&'a ShaderDef> {
    match config {
        Some(config) => catalog
            .get(&config.shader)
            .ok_or_else(|| Error::UnknownShader {
                filename: config.shader.clone(),
            }),
        // Materials without a configuration fall back to the default
        // shader with no texture assignments.
        None => Ok(catalog.default_shader()),
    }
}

/// Match a material's slot assignment to its texture entry by sanitized
/// source name plus sampler-slot name.
fn resolve_texture<'a>(
    config: &MaterialConfig,
    slot: &str,
    textures: &'a [TextureEntry],
) -> Option<&'a TextureEntry> {
    let assigned = config.samplers.get(slot)?.as_ref()?;
    let name = assigned.sanitized_name();
    textures
        .iter()
        .find(|e| e.name == name && e.slot == slot)
}

/// The drawable-model block containing every mesh.
fn write_drawable_model<W: std::io::Write>(
    writer: &mut Writer<W>,
    model: &Model,
    materials: &[MaterialConfig],
    catalog: &ShaderCatalog,
) -> Result<()> {
    let mut tag = BytesStart::new("drawableModel");
    tag.push_attribute(("meshCount", model.meshes.len().to_string().as_str()));
    writer.write_event(Event::Start(tag))?;

    for mesh in &model.meshes {
        let material_name = model.material_names.get(mesh.material_index);
        let config = material_name
            .and_then(|name| materials.iter().find(|m| &m.name == name));
        let needs_tangent = resolve_shader(config, catalog)?.needs_tangent;

        write_geometry(writer, mesh, needs_tangent)?;
    }

    writer.write_event(Event::End(BytesEnd::new("drawableModel")))?;
    Ok(())
}

fn write_geometry<W: std::io::Write>(
    writer: &mut Writer<W>,
    mesh: &Mesh,
    needs_tangent: bool,
) -> Result<()> {
    let layout = if needs_tangent {
        "position normal color uv tangent"
    } else {
        "position normal color uv"
    };

    let mut tag = BytesStart::new("geometry");
    tag.push_attribute(("material", mesh.material_index.to_string().as_str()));
    tag.push_attribute(("vertexCount", mesh.vertex_count().to_string().as_str()));
    tag.push_attribute(("triangleCount", mesh.triangle_count().to_string().as_str()));
    writer.write_event(Event::Start(tag))?;

    let mut vertices = BytesStart::new("vertices");
    vertices.push_attribute(("layout", layout));
    writer.write_event(Event::Start(vertices))?;
    let block = vertex_block(mesh, needs_tangent);
    writer.write_event(Event::Text(BytesText::new(&block)))?;
    writer.write_event(Event::End(BytesEnd::new("vertices")))?;

    let mut indices = BytesStart::new("indices");
    indices.push_attribute(("count", mesh.indices.len().to_string().as_str()));
    writer.write_event(Event::Start(indices))?;
    let block = index_block(&mesh.indices);
    writer.write_event(Event::Text(BytesText::new(&block)))?;
    writer.write_event(Event::End(BytesEnd::new("indices")))?;

    writer.write_event(Event::End(BytesEnd::new("geometry")))?;
    Ok(())
}

/// One line per vertex, fields space-separated in layout order.
fn vertex_block(mesh: &Mesh, needs_tangent: bool) -> String {
    let mut block = String::new();

    for i in 0..mesh.vertex_count() {
        block.push('\n');

        let p = mesh.positions[i];
        let n = mesh.normals[i];
        for v in p.iter().chain(n.iter()) {
            block.push_str(&format_f32(*v));
            block.push(' ');
        }

        // Color defaults to opaque white when the mesh carries none.
        let color = mesh
            .colors
            .as_ref()
            .map_or([255, 255, 255, 255], |c| c[i].map(color_byte));
        for byte in color {
            block.push_str(&byte.to_string());
            block.push(' ');
        }

        let uv = mesh.uvs.get(i).copied().unwrap_or([0.0, 0.0]);
        block.push_str(&format_f32(uv[0]));
        block.push(' ');
        block.push_str(&format_f32(uv[1]));

        if needs_tangent {
            let t = tangent_from_normal(n);
            for v in t {
                block.push(' ');
                block.push_str(&format_f32(v));
            }
            // Fixed handedness.
            block.push_str(" 1.0");
        }
    }

    block.push('\n');
    block
}

/// Tangent derived from the normal: cross against the primary axis least
/// aligned with it, normalized. Handedness is fixed at +1 by the caller.
fn tangent_from_normal(normal: [f32; 3]) -> [f32; 3] {
    let n = Vec3::from(normal);
    let abs = n.abs();

    let axis = if abs.x <= abs.y && abs.x <= abs.z {
        Vec3::X
    } else if abs.y <= abs.z {
        Vec3::Y
    } else {
        Vec3::Z
    };

    n.cross(axis).normalize_or_zero().to_array()
}

/// Flat triangle indices, chunked for readability only.
fn index_block(indices: &[u32]) -> String {
    let mut block = String::new();

    for line in indices.chunks(INDICES_PER_LINE) {
        block.push('\n');
        let mut first = true;
        for index in line {
            if !first {
                block.push(' ');
            }
            block.push_str(&index.to_string());
            first = false;
        }
    }

    block.push('\n');
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ShaderCatalog;
    use crate::model::{TextureFormat, TextureSlot};
    use std::path::PathBuf;

    fn one_triangle_model(material: &str) -> Model {
        Model {
            name: "tri".to_string(),
            meshes: vec![Mesh {
                positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                normals: vec![[0.0, 0.0, 1.0]; 3],
                uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
                colors: None,
                indices: vec![0, 1, 2],
                material_index: 0,
            }],
            material_names: vec![material.to_string()],
        }
    }

    fn entry(name: &str, slot: &str) -> TextureEntry {
        TextureEntry {
            name: name.to_string(),
            slot: slot.to_string(),
            width: 64,
            height: 64,
            format: TextureFormat::Dxt1,
            file_name: format!("{name}.dds"),
        }
    }

    #[test]
    fn sections_appear_in_contract_order() {
        let catalog = ShaderCatalog::builtin();
        let model = one_triangle_model("m");
        let materials = vec![MaterialConfig::new_default("m", &catalog)];
        let doc = serialize(&model, &materials, &[], &catalog).unwrap();

        let sphere = doc.find("<boundingSphere").unwrap();
        let dict = doc.find("<textures>").unwrap();
        let shaders = doc.find("<shaders>").unwrap();
        let drawable = doc.find("<drawableModel").unwrap();
        assert!(sphere < dict && dict < shaders && shaders < drawable);
    }

    #[test]
    fn texture_dictionary_keeps_first_appearance_order() {
        let catalog = ShaderCatalog::builtin();
        let model = one_triangle_model("m");
        let materials = vec![MaterialConfig::new_default("m", &catalog)];

        let entries = vec![
            entry("zebra", "baseMap"),
            entry("apple", "baseMap"),
            entry("zebra", "baseMap"), // duplicate collapses
        ];
        let doc = serialize(&model, &materials, &entries, &catalog).unwrap();

        let zebra = doc.find("name=\"zebra\"").unwrap();
        let apple = doc.find("name=\"apple\"").unwrap();
        assert!(zebra < apple);
        assert_eq!(doc.matches("name=\"zebra\"").count(), 1);
    }

    #[test]
    fn assigned_texture_param_resolves_by_name_and_slot() {
        let catalog = ShaderCatalog::builtin();
        let model = one_triangle_model("m");
        let mut config = MaterialConfig::new_default("m", &catalog);
        config.assign_texture(
            "baseMap",
            TextureSlot {
                source: PathBuf::from("stone.png"),
                width: 64,
                height: 64,
            },
        );

        let entries = vec![entry("stone", "baseMap")];
        let doc = serialize(&model, &[config], &entries, &catalog).unwrap();
        assert!(doc.contains(r#"<textureParam param="baseTexture" name="stone" file="stone.dds"/>"#));
    }

    #[test]
    fn unassigned_texture_param_is_empty_placeholder() {
        let catalog = ShaderCatalog::builtin();
        let model = one_triangle_model("m");
        let materials = vec![MaterialConfig::new_default("m", &catalog)];
        let doc = serialize(&model, &materials, &[], &catalog).unwrap();
        assert!(doc.contains(r#"<textureParam param="baseTexture" name="" file=""/>"#));
    }

    #[test]
    fn vector_params_render_with_defaults() {
        let catalog = ShaderCatalog::builtin();
        let model = one_triangle_model("m");
        let materials = vec![MaterialConfig::new_default("m", &catalog)];
        let doc = serialize(&model, &materials, &[], &catalog).unwrap();
        assert!(doc.contains(r#"<vectorParam param="materialDiffuse" value="1.0 1.0 1.0 1.0"/>"#));
        assert!(doc.contains(r#"<vectorParam param="materialAmbient" value="0.5 0.5 0.5 1.0"/>"#));
    }

    #[test]
    fn vertex_lines_default_color_and_uv() {
        let catalog = ShaderCatalog::builtin();
        let model = one_triangle_model("m");
        let materials = vec![MaterialConfig::new_default("m", &catalog)];
        let doc = serialize(&model, &materials, &[], &catalog).unwrap();
        assert!(doc.contains("0.0 0.0 0.0 0.0 0.0 1.0 255 255 255 255 0.0 0.0"));
    }

    #[test]
    fn tangent_layout_follows_shader_flag() {
        let catalog = ShaderCatalog::builtin();
        let model = one_triangle_model("m");
        let mut config = MaterialConfig::new_default("m", &catalog);
        config.set_shader(catalog.get("bumpspec.fx").unwrap());

        let doc = serialize(&model, &[config], &[], &catalog).unwrap();
        assert!(doc.contains(r#"layout="position normal color uv tangent""#));
        // +Z normal is least aligned with X, tangent = normalize(Z x X) = Y.
        assert!(doc.contains("0.0 0.0 1.0 255 255 255 255 0.0 0.0 0.0 1.0 0.0 1.0"));
    }

    #[test]
    fn material_names_are_entity_escaped() {
        let catalog = ShaderCatalog::builtin();
        let model = one_triangle_model("Glass & \"Steel\" <v2>");
        let materials = vec![MaterialConfig::new_default(
            "Glass & \"Steel\" <v2>",
            &catalog,
        )];
        let doc = serialize(&model, &materials, &[], &catalog).unwrap();
        assert!(doc.contains("Glass &amp; &quot;Steel&quot; &lt;v2&gt;"));
        assert!(!doc.contains("Glass & \"Steel\""));
    }

    #[test]
    fn index_chunking_preserves_sequence() {
        let mut indices = Vec::new();
        for i in 0..30u32 {
            indices.push(i);
        }
        let block = index_block(&indices);
        let decoded: Vec<u32> = block
            .split_whitespace()
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(decoded, indices);
        // 30 indices at 12 per line -> 3 lines. The block opens with a
        // newline, so trim both ends before counting.
        assert_eq!(block.trim().lines().count(), 3);
    }

    #[test]
    fn tangent_avoids_degenerate_axis() {
        // Normal along X must not cross against X.
        let t = tangent_from_normal([1.0, 0.0, 0.0]);
        let len = (t[0] * t[0] + t[1] * t[1] + t[2] * t[2]).sqrt();
        assert!((len - 1.0).abs() < 1e-6);
    }
}
