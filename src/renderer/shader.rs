//! WGSL program loading. Sources are compiled with naga first so parse and
//! validation diagnostics can be logged with context, and so every name a
//! stage binds by can be checked before any pipeline is built.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::io;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    Shadow,
    Irradiance,
    Material,
    Composite,
}

/// Names and slots a program must provide for its stage.
pub struct ProgramInterface {
    pub entry_points: &'static [&'static str],
    /// Global name, bind group, binding.
    pub bindings: &'static [(&'static str, u32, u32)],
    /// Vertex input locations the stage's vertex buffers supply.
    pub vertex_locations: &'static [u32],
}

impl ProgramKind {
    pub const ALL: [ProgramKind; 4] = [
        ProgramKind::Shadow,
        ProgramKind::Irradiance,
        ProgramKind::Material,
        ProgramKind::Composite,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ProgramKind::Shadow => "shadow.wgsl",
            ProgramKind::Irradiance => "irradiance.wgsl",
            ProgramKind::Material => "material.wgsl",
            ProgramKind::Composite => "composite.wgsl",
        }
    }

    pub fn interface(self) -> ProgramInterface {
        match self {
            ProgramKind::Shadow => ProgramInterface {
                entry_points: &["vs_main"],
                bindings: &[("shadow_view", 0, 0), ("object", 1, 0)],
                vertex_locations: &[0],
            },
            ProgramKind::Irradiance => ProgramInterface {
                entry_points: &["vs_main", "fs_shadowed", "fs_unshadowed"],
                bindings: &[
                    ("frame", 0, 0),
                    ("object", 1, 0),
                    ("light", 2, 0),
                    ("shadow_map", 2, 1),
                    ("shadow_sampler", 2, 2),
                ],
                vertex_locations: &[0],
            },
            ProgramKind::Material => ProgramInterface {
                entry_points: &["vs_main", "fs_main"],
                bindings: &[
                    ("frame", 0, 0),
                    ("object", 1, 0),
                    ("material", 2, 0),
                    ("ambient_texture", 2, 1),
                    ("diffuse_texture", 2, 2),
                    ("material_sampler", 2, 3),
                ],
                vertex_locations: &[0, 1, 2],
            },
            ProgramKind::Composite => ProgramInterface {
                entry_points: &["vs_main", "fs_main"],
                bindings: &[
                    ("g_normal", 0, 0),
                    ("g_ambient", 0, 1),
                    ("g_diffuse", 0, 2),
                    ("g_specular", 0, 3),
                    ("g_exponent", 0, 4),
                    ("g_position", 0, 5),
                    ("light", 1, 0),
                    ("irradiance", 1, 1),
                ],
                vertex_locations: &[0],
            },
        }
    }
}

/// What naga found in a compiled module.
#[derive(Debug, Default)]
pub struct Reflection {
    entry_points: HashMap<String, naga::ShaderStage>,
    bindings: HashMap<String, (u32, u32)>,
    vertex_inputs: HashMap<String, Vec<u32>>,
}

impl Reflection {
    /// Parses and validates WGSL. The error carries the compiler diagnostic.
    pub fn compile(source: &str) -> Result<Reflection, String> {
        let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| e.emit_to_string(source))?;

        Ok(Self::from_module(&module))
    }

    fn from_module(module: &naga::Module) -> Reflection {
        let mut reflection = Reflection::default();

        for (_, global) in module.global_variables.iter() {
            if let (Some(name), Some(binding)) = (&global.name, &global.binding) {
                reflection
                    .bindings
                    .insert(name.clone(), (binding.group, binding.binding));
            }
        }

        for entry in &module.entry_points {
            reflection
                .entry_points
                .insert(entry.name.clone(), entry.stage);
            if entry.stage == naga::ShaderStage::Vertex {
                let mut locations = Vec::new();
                for argument in &entry.function.arguments {
                    collect_locations(module, argument.ty, argument.binding.as_ref(), &mut locations);
                }
                reflection
                    .vertex_inputs
                    .insert(entry.name.clone(), locations);
            }
        }

        reflection
    }

    pub fn has_entry_point(&self, name: &str) -> bool {
        self.entry_points.contains_key(name)
    }

    pub fn binding(&self, name: &str) -> Option<(u32, u32)> {
        self.bindings.get(name).copied()
    }

    pub fn vertex_inputs(&self, entry: &str) -> &[u32] {
        self.vertex_inputs
            .get(entry)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Entry points of `interface` that can be used, logging every problem.
    /// A binding mismatch makes the whole program unusable.
    pub fn check(&self, label: &str, interface: &ProgramInterface) -> HashSet<&'static str> {
        let mut bindings_ok = true;
        for &(name, group, binding) in interface.bindings {
            match self.binding(name) {
                Some(found) if found == (group, binding) => {}
                Some((found_group, found_binding)) => {
                    log::error!(
                        "{label}: '{name}' is bound at @group({found_group}) @binding({found_binding}), expected @group({group}) @binding({binding})"
                    );
                    bindings_ok = false;
                }
                None => {
                    log::error!("{label}: required global '{name}' not found");
                    bindings_ok = false;
                }
            }
        }
        if !bindings_ok {
            return HashSet::new();
        }

        let mut usable = HashSet::new();
        for &entry in interface.entry_points {
            if !self.has_entry_point(entry) {
                log::error!("{label}: entry point '{entry}' not found");
                continue;
            }
            let missing: Vec<u32> = self
                .vertex_inputs(entry)
                .iter()
                .copied()
                .filter(|location| !interface.vertex_locations.contains(location))
                .collect();
            if !missing.is_empty() {
                log::error!(
                    "{label}: '{entry}' reads vertex attribute locations {missing:?} that no buffer supplies"
                );
                continue;
            }
            usable.insert(entry);
        }
        usable
    }
}

fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Vec<u32>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => out.push(*location),
        Some(_) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

/// One compiled program. `module` is `None` when compilation failed.
pub struct ShaderProgram {
    pub kind: ProgramKind,
    module: Option<wgpu::ShaderModule>,
    usable: HashSet<&'static str>,
}

impl ShaderProgram {
    fn load(device: &wgpu::Device, dir: &Path, kind: ProgramKind) -> Self {
        let path = dir.join(kind.file_name());
        let label = kind.file_name();
        let source = io::read_text(&path);

        let (module, usable) = match Reflection::compile(&source) {
            Ok(reflection) => {
                let usable = reflection.check(label, &kind.interface());
                let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(label),
                    source: wgpu::ShaderSource::Wgsl(std::borrow::Cow::Owned(source)),
                });
                log::info!("Compiled {} ({} usable entry points)", label, usable.len());
                (Some(shader), usable)
            }
            Err(diagnostic) => {
                log::error!("Failed to compile {:?}:\n{}", path, diagnostic);
                (None, HashSet::new())
            }
        };

        Self {
            kind,
            module,
            usable,
        }
    }

    /// The module, if every named entry point compiled and passed the interface check.
    pub fn module_for(&self, entries: &[&str]) -> Option<&wgpu::ShaderModule> {
        let module = self.module.as_ref()?;
        entries
            .iter()
            .all(|entry| self.usable.contains(entry))
            .then_some(module)
    }

    pub fn is_compiled(&self) -> bool {
        self.module.is_some()
    }
}

/// The four programs the stages are built from.
pub struct ShaderLibrary {
    programs: Vec<ShaderProgram>,
}

impl ShaderLibrary {
    pub fn load(device: &wgpu::Device, dir: &Path) -> Self {
        log::info!("Loading shaders from {:?}", dir);
        let programs = ProgramKind::ALL
            .iter()
            .map(|&kind| ShaderProgram::load(device, dir, kind))
            .collect();
        Self { programs }
    }

    pub fn program(&self, kind: ProgramKind) -> Option<&ShaderProgram> {
        self.programs.iter().find(|program| program.kind == kind)
    }

    pub fn module_for(&self, kind: ProgramKind, entries: &[&str]) -> Option<&wgpu::ShaderModule> {
        let module = self.program(kind)?.module_for(entries);
        if module.is_none() {
            log::warn!(
                "{} entry points {:?} unavailable; stage will only clear its outputs",
                kind.file_name(),
                entries
            );
        }
        module
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn shader_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("shaders")
    }

    #[test]
    fn bundled_programs_satisfy_their_interfaces() {
        for kind in ProgramKind::ALL {
            let source = io::read_text(&shader_dir().join(kind.file_name()));
            let reflection = Reflection::compile(&source)
                .unwrap_or_else(|err| panic!("{} failed:\n{err}", kind.file_name()));
            let interface = kind.interface();
            let usable = reflection.check(kind.file_name(), &interface);
            for entry in interface.entry_points {
                assert!(usable.contains(entry), "{} missing {entry}", kind.file_name());
            }
        }
    }

    #[test]
    fn parse_errors_carry_diagnostics() {
        let err = Reflection::compile("fn broken( {").err().unwrap_or_default();
        assert!(!err.is_empty());
    }

    #[test]
    fn empty_source_has_no_entry_points() {
        let reflection = Reflection::compile("").expect("empty module is valid");
        let usable = reflection.check("empty", &ProgramKind::Composite.interface());
        assert!(usable.is_empty());
    }

    #[test]
    fn misplaced_binding_disables_program() {
        let source = r#"
            struct ShadowView { view_proj: mat4x4<f32> }
            struct Object { model: mat4x4<f32> }
            @group(0) @binding(0) var<uniform> shadow_view: ShadowView;
            @group(0) @binding(1) var<uniform> object: Object;

            @vertex
            fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
                return shadow_view.view_proj * object.model * vec4<f32>(position, 1.0);
            }
        "#;
        let reflection = Reflection::compile(source).expect("valid wgsl");
        assert_eq!(reflection.binding("object"), Some((0, 1)));
        assert!(reflection
            .check("shadow", &ProgramKind::Shadow.interface())
            .is_empty());
    }

    #[test]
    fn unsupplied_vertex_location_disables_entry() {
        let source = r#"
            struct ShadowView { view_proj: mat4x4<f32> }
            struct Object { model: mat4x4<f32> }
            @group(0) @binding(0) var<uniform> shadow_view: ShadowView;
            @group(1) @binding(0) var<uniform> object: Object;

            struct VertexIn {
                @location(0) position: vec3<f32>,
                @location(3) extra: vec2<f32>,
            }

            @vertex
            fn vs_main(input: VertexIn) -> @builtin(position) vec4<f32> {
                let offset = vec4<f32>(input.extra, 0.0, 0.0);
                return shadow_view.view_proj * object.model * vec4<f32>(input.position, 1.0) + offset;
            }
        "#;
        let reflection = Reflection::compile(source).expect("valid wgsl");
        assert_eq!(reflection.vertex_inputs("vs_main"), &[0, 3]);
        assert!(reflection
            .check("shadow", &ProgramKind::Shadow.interface())
            .is_empty());
    }
}
