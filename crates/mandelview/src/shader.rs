//! Shader source loading, validation and uniform-block reflection.
//!
//! WGSL is parsed and validated with naga before it ever reaches the device,
//! so a broken shader surfaces as a [`ProgramError`] instead of a device
//! validation panic. The uniform block at `@group(0) @binding(0)` is reflected
//! into a [`UniformLayout`]; member byte offsets serve as uniform locations.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use naga::{AddressSpace, Binding, Module, Scalar, ShaderStage, TypeInner, VectorSize};

use crate::error::ProgramError;

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Bind group and binding index of the uniform block.
pub const UNIFORM_GROUP: u32 = 0;
pub const UNIFORM_BINDING: u32 = 0;

const EMBEDDED_WGSL: &str = include_str!("../shaders/mandelbrot.wgsl");

// ── source ────────────────────────────────────────────────────────────────

/// WGSL text plus a label used in logs and diagnostics.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub label: String,
    pub text: String,
}

impl ShaderSource {
    /// The Mandelbrot program shipped with the crate.
    pub fn embedded() -> Self {
        Self {
            label: "mandelbrot.wgsl (embedded)".to_string(),
            text: EMBEDDED_WGSL.to_string(),
        }
    }

    pub fn from_wgsl(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }

    /// Reads a WGSL file from disk. A missing or unreadable file is an error;
    /// its contents are not checked until [`compile_program`].
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read shader file {}", path.display()))?;
        Ok(Self {
            label: path.display().to_string(),
            text,
        })
    }
}

// ── reflection ────────────────────────────────────────────────────────────

/// Value type of one uniform block member, as far as the viewer cares.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformKind {
    /// `vec2<f32>`
    Vec2F32,
    /// `i32`
    I32,
    /// Anything else; present in the block but never written.
    Other,
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformKind::Vec2F32 => f.write_str("vec2<f32>"),
            UniformKind::I32 => f.write_str("i32"),
            UniformKind::Other => f.write_str("<other>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformMember {
    pub name: String,
    pub offset: u32,
    pub kind: UniformKind,
}

/// Handle for writing one uniform: byte offset inside the block plus its type.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformLocation {
    pub offset: u32,
    pub kind: UniformKind,
}

/// Reflected layout of the uniform block. Empty when the shader declares none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniformLayout {
    /// Block size in bytes as laid out by WGSL rules.
    pub span: u32,
    pub members: Vec<UniformMember>,
}

impl UniformLayout {
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn location(&self, name: &str) -> Option<UniformLocation> {
        self.members
            .iter()
            .find(|m| m.name == name)
            .map(|m| UniformLocation {
                offset: m.offset,
                kind: m.kind,
            })
    }

    /// GPU buffer size: `span` rounded up to 16 bytes, never zero.
    pub fn buffer_size(&self) -> u64 {
        u64::from(self.span.max(16)).next_multiple_of(16)
    }
}

/// A validated module that fits the viewer pipeline.
#[derive(Debug, Clone)]
pub struct CompiledShader {
    pub source: ShaderSource,
    pub layout: UniformLayout,
}

// ── compile / link ────────────────────────────────────────────────────────

/// Parses, validates and links `source` against the viewer pipeline.
///
/// Link requirements:
/// - a vertex entry point `vs_main` and a fragment entry point `fs_main`
/// - vertex inputs limited to `@location(0) vec2<f32>` (the quad corner)
/// - at most one bound resource, a uniform struct at group 0 binding 0
pub fn compile_program(source: &ShaderSource) -> Result<CompiledShader, ProgramError> {
    let module = naga::front::wgsl::parse_str(&source.text).map_err(|e| ProgramError::Compile {
        label: source.label.clone(),
        message: e.emit_to_string(&source.text),
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    );
    validator.validate(&module).map_err(|e| ProgramError::Compile {
        label: source.label.clone(),
        message: e.as_inner().to_string(),
    })?;

    let link_err = |message: String| ProgramError::Link {
        label: source.label.clone(),
        message,
    };

    check_entry_point(&module, VERTEX_ENTRY, ShaderStage::Vertex).map_err(link_err)?;
    check_entry_point(&module, FRAGMENT_ENTRY, ShaderStage::Fragment).map_err(link_err)?;
    check_vertex_inputs(&module).map_err(link_err)?;
    let layout = reflect_uniform_block(&module).map_err(link_err)?;

    Ok(CompiledShader {
        source: source.clone(),
        layout,
    })
}

fn check_entry_point(module: &Module, name: &str, stage: ShaderStage) -> Result<(), String> {
    match module.entry_points.iter().find(|ep| ep.name == name) {
        Some(ep) if ep.stage == stage => Ok(()),
        Some(ep) => Err(format!(
            "entry point `{name}` has stage {:?}, expected {stage:?}",
            ep.stage
        )),
        None => Err(format!("missing {stage:?} entry point `{name}`")),
    }
}

fn check_vertex_inputs(module: &Module) -> Result<(), String> {
    let Some(ep) = module.entry_points.iter().find(|ep| ep.name == VERTEX_ENTRY) else {
        return Ok(());
    };

    let mut inputs = Vec::new();
    for arg in &ep.function.arguments {
        match &arg.binding {
            Some(Binding::Location { location, .. }) => inputs.push((*location, arg.ty)),
            Some(Binding::BuiltIn(_)) => {}
            None => {
                if let TypeInner::Struct { members, .. } = &module.types[arg.ty].inner {
                    for m in members {
                        if let Some(Binding::Location { location, .. }) = &m.binding {
                            inputs.push((*location, m.ty));
                        }
                    }
                }
            }
        }
    }

    for (location, ty) in inputs {
        if location != 0 || uniform_kind(module, ty) != UniformKind::Vec2F32 {
            return Err(format!(
                "unsupported vertex input at location {location}; only `@location(0) vec2<f32>` is provided"
            ));
        }
    }
    Ok(())
}

fn reflect_uniform_block(module: &Module) -> Result<UniformLayout, String> {
    let mut layout = UniformLayout::default();

    for (_, var) in module.global_variables.iter() {
        let Some(rb) = &var.binding else { continue };

        if (rb.group, rb.binding) != (UNIFORM_GROUP, UNIFORM_BINDING) {
            return Err(format!(
                "unsupported resource at @group({}) @binding({})",
                rb.group, rb.binding
            ));
        }
        if var.space != AddressSpace::Uniform {
            return Err(format!(
                "resource at @group({UNIFORM_GROUP}) @binding({UNIFORM_BINDING}) is not a uniform block"
            ));
        }

        let TypeInner::Struct { members, span } = &module.types[var.ty].inner else {
            return Err("uniform block must be a struct".to_string());
        };

        layout.span = *span;
        layout.members = members
            .iter()
            .filter_map(|m| {
                let name = m.name.clone()?;
                Some(UniformMember {
                    name,
                    offset: m.offset,
                    kind: uniform_kind(module, m.ty),
                })
            })
            .collect();
    }

    Ok(layout)
}

fn uniform_kind(module: &Module, ty: naga::Handle<naga::Type>) -> UniformKind {
    match module.types[ty].inner {
        TypeInner::Vector {
            size: VectorSize::Bi,
            scalar,
        } if scalar == Scalar::F32 => UniformKind::Vec2F32,
        TypeInner::Scalar(scalar) if scalar == Scalar::I32 => UniformKind::I32,
        _ => UniformKind::Other,
    }
}
