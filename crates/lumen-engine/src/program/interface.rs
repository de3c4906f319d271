//! WGSL stage compilation, link checks, and binding reflection.
//!
//! Runs entirely on naga IR, so it needs no device. The resulting modules are
//! handed to wgpu as `ShaderSource::Naga`, skipping a second parse.

use std::collections::BTreeMap;

use wgpu::naga;

use crate::error::{EngineError, Result, ShaderStage};
use crate::render::params::EffectParams;
use crate::render::quad::{
    PARAMS_BINDING, PARAMS_GROUP, POSITION_LOCATION, SAMPLER_BINDING, TEXCOORD_LOCATION,
    TEXTURE_BINDING, TEXTURE_GROUP,
};
use crate::render::{FRAGMENT_ENTRY, VERTEX_ENTRY};

/// Vertex streams supplied by the quad geometry.
const QUAD_ATTRIBUTES: [(u32, &str); 2] = [
    (POSITION_LOCATION, "position"),
    (TEXCOORD_LOCATION, "texcoord"),
];

/// Where a uniform lives: bind group, binding, and byte offset inside the
/// bound resource (non-zero only for members of a uniform block).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformSlot {
    pub group: u32,
    pub binding: u32,
    pub offset: u32,
}

/// Attribute and uniform bindings of a linked program, keyed by semantic name.
///
/// Resource names drop a leading `u_` (`u_texture` is `texture`). Members of a
/// uniform block are listed individually (`resolution`, `direction`) next to
/// the block itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderInterface {
    attributes: BTreeMap<String, u32>,
    uniforms: BTreeMap<String, UniformSlot>,
}

impl ShaderInterface {
    /// Compiles and links a stage pair without touching the GPU.
    pub fn reflect(program: &str, vertex_source: &str, fragment_source: &str) -> Result<Self> {
        link(program, vertex_source, fragment_source).map(|linked| linked.interface)
    }

    pub fn attribute(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).copied()
    }

    pub fn uniform(&self, name: &str) -> Option<UniformSlot> {
        self.uniforms.get(name).copied()
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, u32)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn uniforms(&self) -> impl Iterator<Item = (&str, UniformSlot)> {
        self.uniforms.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Both stages in IR form plus the reflected interface.
pub(crate) struct LinkedStages {
    pub vertex: naga::Module,
    pub fragment: naga::Module,
    pub interface: ShaderInterface,
}

pub(crate) fn link(program: &str, vertex_source: &str, fragment_source: &str) -> Result<LinkedStages> {
    let vertex = compile_stage(program, ShaderStage::Vertex, vertex_source)?;
    let fragment = compile_stage(program, ShaderStage::Fragment, fragment_source)?;

    let link_error = |log: String| EngineError::ShaderLink {
        program: program.to_owned(),
        log,
    };

    let vs = find_entry(&vertex, ShaderStage::Vertex)
        .ok_or_else(|| link_error(format!("vertex entry point `{VERTEX_ENTRY}` not found")))?;
    let fs = find_entry(&fragment, ShaderStage::Fragment)
        .ok_or_else(|| link_error(format!("fragment entry point `{FRAGMENT_ENTRY}` not found")))?;

    let vs_inputs = argument_locations(&vertex, &vs.function.arguments);
    let vs_outputs = result_locations(&vertex, vs.function.result.as_ref());
    let fs_inputs = argument_locations(&fragment, &fs.function.arguments);
    check_fragment_output(&fragment, fs.function.result.as_ref()).map_err(link_error)?;

    for (name, location) in &vs_inputs {
        if !QUAD_ATTRIBUTES.iter().any(|(l, _)| l == location) {
            return Err(link_error(format!(
                "vertex input `{}` at location {location} is not supplied by the quad geometry",
                display_name(name)
            )));
        }
    }
    if !vs_inputs.iter().any(|(_, l)| *l == POSITION_LOCATION) {
        return Err(link_error(format!(
            "vertex stage does not read `position` at location {POSITION_LOCATION}"
        )));
    }

    for (name, location) in &fs_inputs {
        if !vs_outputs.iter().any(|(_, l)| l == location) {
            return Err(link_error(format!(
                "fragment input `{}` at location {location} is not written by the vertex stage",
                display_name(name)
            )));
        }
    }

    if let Some(name) = vertex.global_variables.iter().find_map(|(_, v)| {
        v.binding.as_ref().map(|_| v.name.clone())
    }) {
        return Err(link_error(format!(
            "vertex resource `{}` is not available: the quad layout binds resources to the fragment stage only",
            display_name(&name)
        )));
    }

    let mut interface = ShaderInterface::default();

    for (name, location) in &vs_inputs {
        let semantic = match name {
            Some(n) => n.clone(),
            None => QUAD_ATTRIBUTES
                .iter()
                .find(|(l, _)| l == location)
                .map(|(_, n)| (*n).to_owned())
                .unwrap_or_default(),
        };
        interface.attributes.insert(semantic, *location);
    }

    for (_, var) in fragment.global_variables.iter() {
        let Some(rb) = var.binding.as_ref() else {
            continue;
        };
        check_resource(&fragment, var, rb).map_err(link_error)?;

        let name = semantic_name(var.name.as_deref().unwrap_or_default());
        interface.uniforms.insert(
            name.to_owned(),
            UniformSlot {
                group: rb.group,
                binding: rb.binding,
                offset: 0,
            },
        );

        if let naga::TypeInner::Struct { members, .. } = &fragment.types[var.ty].inner {
            for member in members {
                if let Some(member_name) = member.name.as_ref() {
                    interface.uniforms.insert(
                        member_name.clone(),
                        UniformSlot {
                            group: rb.group,
                            binding: rb.binding,
                            offset: member.offset,
                        },
                    );
                }
            }
        }
    }

    Ok(LinkedStages {
        vertex,
        fragment,
        interface,
    })
}

/// Parses and validates one stage, then checks its entry point exists.
fn compile_stage(program: &str, stage: ShaderStage, source: &str) -> Result<naga::Module> {
    let compile_error = |log: String| EngineError::ShaderCompile {
        program: program.to_owned(),
        stage,
        log,
    };

    let module = naga::front::wgsl::parse_str(source).map_err(|e| compile_error(e.emit_to_string(source)))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    );
    validator
        .validate(&module)
        .map_err(|e| compile_error(e.emit_to_string(source)))?;

    if find_entry(&module, stage).is_none() {
        let entry = entry_name(stage);
        return Err(compile_error(format!("no {stage} entry point named `{entry}`")));
    }

    Ok(module)
}

fn entry_name(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => VERTEX_ENTRY,
        ShaderStage::Fragment => FRAGMENT_ENTRY,
    }
}

fn find_entry(module: &naga::Module, stage: ShaderStage) -> Option<&naga::EntryPoint> {
    let kind = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };
    let name = entry_name(stage);
    module
        .entry_points
        .iter()
        .find(|ep| ep.stage == kind && ep.name == name)
}

type Location = (Option<String>, u32);

fn argument_locations(module: &naga::Module, args: &[naga::FunctionArgument]) -> Vec<Location> {
    let mut out = Vec::new();
    for arg in args {
        match &arg.binding {
            Some(naga::Binding::Location { location, .. }) => out.push((arg.name.clone(), *location)),
            Some(_) => {}
            None => out.extend(struct_locations(module, arg.ty)),
        }
    }
    out
}

fn result_locations(module: &naga::Module, result: Option<&naga::FunctionResult>) -> Vec<Location> {
    match result {
        Some(r) => match &r.binding {
            Some(naga::Binding::Location { location, .. }) => vec![(None, *location)],
            Some(_) => Vec::new(),
            None => struct_locations(module, r.ty),
        },
        None => Vec::new(),
    }
}

fn struct_locations(module: &naga::Module, ty: naga::Handle<naga::Type>) -> Vec<Location> {
    match &module.types[ty].inner {
        naga::TypeInner::Struct { members, .. } => members
            .iter()
            .filter_map(|m| match &m.binding {
                Some(naga::Binding::Location { location, .. }) => Some((m.name.clone(), *location)),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Checks a fragment resource against the shared quad pipeline layout.
fn check_resource(
    module: &naga::Module,
    var: &naga::GlobalVariable,
    rb: &naga::ResourceBinding,
) -> std::result::Result<(), String> {
    let inner = &module.types[var.ty].inner;
    let fits = match (rb.group, rb.binding) {
        (TEXTURE_GROUP, TEXTURE_BINDING) => matches!(
            inner,
            naga::TypeInner::Image {
                dim: naga::ImageDimension::D2,
                arrayed: false,
                class: naga::ImageClass::Sampled {
                    kind: naga::ScalarKind::Float,
                    multi: false,
                },
            }
        ),
        (TEXTURE_GROUP, SAMPLER_BINDING) => {
            matches!(inner, naga::TypeInner::Sampler { comparison: false })
        }
        (PARAMS_GROUP, PARAMS_BINDING) => {
            var.space == naga::AddressSpace::Uniform
                && u64::from(inner.size(module.to_ctx())) <= EffectParams::SIZE
        }
        _ => false,
    };

    if fits {
        Ok(())
    } else {
        Err(format!(
            "fragment resource `{}` (group {}, binding {}) does not match the quad pipeline layout",
            display_name(&var.name),
            rb.group,
            rb.binding
        ))
    }
}

/// The quad pipeline has a single color target at location 0.
fn check_fragment_output(
    module: &naga::Module,
    result: Option<&naga::FunctionResult>,
) -> std::result::Result<(), String> {
    let outputs: Vec<(u32, naga::Handle<naga::Type>)> = match result {
        None => Vec::new(),
        Some(r) => match &r.binding {
            Some(naga::Binding::Location { location, .. }) => vec![(*location, r.ty)],
            Some(_) => Vec::new(),
            None => match &module.types[r.ty].inner {
                naga::TypeInner::Struct { members, .. } => members
                    .iter()
                    .filter_map(|m| match &m.binding {
                        Some(naga::Binding::Location { location, .. }) => Some((*location, m.ty)),
                        _ => None,
                    })
                    .collect(),
                _ => Vec::new(),
            },
        },
    };

    let [(location, ty)] = outputs[..] else {
        return Err(format!(
            "fragment stage writes {} color outputs; the quad pipeline has exactly one",
            outputs.len()
        ));
    };
    if location != 0 {
        return Err(format!(
            "fragment output at location {location} has no color target; use location 0"
        ));
    }
    let is_float4 = matches!(
        module.types[ty].inner,
        naga::TypeInner::Vector {
            size: naga::VectorSize::Quad,
            scalar: naga::Scalar {
                kind: naga::ScalarKind::Float,
                ..
            },
        }
    );
    if !is_float4 {
        return Err("fragment output must be vec4<f32> to match the color target".to_owned());
    }
    Ok(())
}

fn semantic_name(name: &str) -> &str {
    name.strip_prefix("u_").unwrap_or(name)
}

fn display_name(name: &Option<String>) -> &str {
    name.as_deref().unwrap_or("<unnamed>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::shaders;

    const PLAIN_FRAGMENT: &str = r#"
@fragment
fn fs_main(@location(0) texcoord: vec2<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(texcoord, 0.0, 1.0);
}
"#;

    #[test]
    fn builtin_programs_link() {
        for (name, fragment) in [
            ("passthrough", shaders::PASSTHROUGH),
            ("grayscale", shaders::GRAYSCALE),
            ("invert", shaders::INVERT),
            ("directional-blur", shaders::DIRECTIONAL_BLUR),
        ] {
            if let Err(e) = ShaderInterface::reflect(name, shaders::QUAD_VERTEX, fragment) {
                panic!("{name} failed to link: {e}");
            }
        }
    }

    #[test]
    fn reflects_quad_attributes_and_texture_bindings() {
        let iface = ShaderInterface::reflect("grayscale", shaders::QUAD_VERTEX, shaders::GRAYSCALE).unwrap();

        assert_eq!(iface.attribute("position"), Some(POSITION_LOCATION));
        assert_eq!(iface.attribute("texcoord"), Some(TEXCOORD_LOCATION));
        assert_eq!(
            iface.uniform("texture"),
            Some(UniformSlot { group: 0, binding: 0, offset: 0 })
        );
        assert_eq!(
            iface.uniform("sampler"),
            Some(UniformSlot { group: 0, binding: 1, offset: 0 })
        );
        assert_eq!(iface.uniform("resolution"), None);
    }

    #[test]
    fn reflects_uniform_block_members() {
        let iface =
            ShaderInterface::reflect("directional-blur", shaders::QUAD_VERTEX, shaders::DIRECTIONAL_BLUR)
                .unwrap();

        assert_eq!(
            iface.uniform("resolution"),
            Some(UniformSlot { group: 1, binding: 0, offset: 0 })
        );
        assert_eq!(
            iface.uniform("direction"),
            Some(UniformSlot { group: 1, binding: 0, offset: 8 })
        );
    }

    #[test]
    fn syntax_error_is_a_fragment_compile_error() {
        let err = ShaderInterface::reflect("broken", shaders::QUAD_VERTEX, "fn fs_main( {").unwrap_err();
        match err {
            EngineError::ShaderCompile { program, stage, log } => {
                assert_eq!(program, "broken");
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_entry_point_is_a_compile_error() {
        let fragment = PLAIN_FRAGMENT.replace("fs_main", "main");
        let err = ShaderInterface::reflect("renamed", shaders::QUAD_VERTEX, &fragment).unwrap_err();
        assert!(matches!(
            err,
            EngineError::ShaderCompile { stage: ShaderStage::Fragment, .. }
        ));
    }

    #[test]
    fn fragment_input_must_be_written_by_vertex_stage() {
        let fragment = PLAIN_FRAGMENT.replace("@location(0) texcoord", "@location(3) texcoord");
        let err = ShaderInterface::reflect("mismatch", shaders::QUAD_VERTEX, &fragment).unwrap_err();
        match err {
            EngineError::ShaderLink { log, .. } => assert!(log.contains("location 3"), "{log}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn vertex_inputs_must_come_from_quad_geometry() {
        let vertex = shaders::QUAD_VERTEX.replace("@location(1) texcoord", "@location(2) texcoord");
        let err = ShaderInterface::reflect("extra-attr", &vertex, PLAIN_FRAGMENT).unwrap_err();
        assert!(matches!(err, EngineError::ShaderLink { .. }));
    }

    #[test]
    fn fragment_resources_must_fit_quad_layout() {
        let fragment = format!(
            "@group(2) @binding(0) var<uniform> extra: vec4<f32>;\n{}",
            PLAIN_FRAGMENT.replace("vec4<f32>(texcoord, 0.0, 1.0)", "extra + vec4<f32>(texcoord, 0.0, 0.0)")
        );
        let err = ShaderInterface::reflect("extra-group", shaders::QUAD_VERTEX, &fragment).unwrap_err();
        match err {
            EngineError::ShaderLink { log, .. } => assert!(log.contains("group 2"), "{log}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    fn link_log(program: &str, fragment: &str) -> String {
        match ShaderInterface::reflect(program, shaders::QUAD_VERTEX, fragment) {
            Err(EngineError::ShaderLink { log, .. }) => log,
            Err(other) => panic!("{program}: unexpected error: {other}"),
            Ok(_) => panic!("{program}: linked but the quad pipeline cannot run it"),
        }
    }

    fn sampling_fragment(texture_decl: &str, sample: &str) -> String {
        format!(
            r#"
@group(0) @binding(0) var u_texture: {texture_decl};
@group(0) @binding(1) var u_sampler: sampler;

@fragment
fn fs_main(@location(0) texcoord: vec2<f32>) -> @location(0) vec4<f32> {{
    return {sample};
}}
"#
        )
    }

    #[test]
    fn texture_binding_must_be_a_float_2d_texture() {
        let volume = sampling_fragment(
            "texture_3d<f32>",
            "textureSample(u_texture, u_sampler, vec3<f32>(texcoord, 0.0))",
        );
        assert!(link_log("volume", &volume).contains("group 0, binding 0"));

        let unsigned = sampling_fragment(
            "texture_2d<u32>",
            "vec4<f32>(textureLoad(u_texture, vec2<i32>(texcoord), 0))",
        );
        assert!(link_log("unsigned", &unsigned).contains("group 0, binding 0"));

        let depth = sampling_fragment(
            "texture_depth_2d",
            "vec4<f32>(textureSample(u_texture, u_sampler, texcoord))",
        );
        assert!(link_log("depth", &depth).contains("group 0, binding 0"));

        let layered = sampling_fragment(
            "texture_2d_array<f32>",
            "textureSample(u_texture, u_sampler, texcoord, 0)",
        );
        assert!(link_log("layered", &layered).contains("group 0, binding 0"));
    }

    #[test]
    fn fragment_output_must_be_one_float4_at_location_zero() {
        let moved = PLAIN_FRAGMENT.replace("-> @location(0)", "-> @location(1)");
        assert!(link_log("moved", &moved).contains("location 1"));

        let integer = r#"
@fragment
fn fs_main(@location(0) texcoord: vec2<f32>) -> @location(0) vec4<i32> {
    return vec4<i32>(vec2<i32>(texcoord), 0, 1);
}
"#;
        assert!(link_log("integer", integer).contains("vec4<f32>"));

        let two_targets = r#"
struct Out {
    @location(0) color: vec4<f32>,
    @location(1) extra: vec4<f32>,
}

@fragment
fn fs_main(@location(0) texcoord: vec2<f32>) -> Out {
    return Out(vec4<f32>(texcoord, 0.0, 1.0), vec4<f32>(1.0));
}
"#;
        assert!(link_log("two-targets", two_targets).contains("2 color outputs"));

        let colorless = r#"
@fragment
fn fs_main(@location(0) texcoord: vec2<f32>) {
}
"#;
        assert!(link_log("colorless", colorless).contains("0 color outputs"));
    }

    #[test]
    fn struct_output_at_location_zero_links() {
        let fragment = r#"
struct Out {
    @location(0) color: vec4<f32>,
}

@fragment
fn fs_main(@location(0) texcoord: vec2<f32>) -> Out {
    return Out(vec4<f32>(texcoord, 0.0, 1.0));
}
"#;
        assert!(ShaderInterface::reflect("struct-out", shaders::QUAD_VERTEX, fragment).is_ok());
    }
}
