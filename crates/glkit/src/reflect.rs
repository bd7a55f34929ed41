//! Shader reflection.
//!
//! Declarations are found with a line-oriented scanner that accepts exactly
//!
//! ```text
//! [layout(location = N)] [precision] (in | uniform) [precision] TYPE NAME [ '[' SIZE ']' ] ;
//! ```
//!
//! on a single line, ignoring leading whitespace and `//` comments. Anything
//! else (multi-line or macro-generated declarations, blocks, structs) is
//! invisible. Scanned declarations are then checked against the linked
//! program, which is the authority on what is active and where it lives.

use std::collections::{BTreeMap, BTreeSet};

use glkit_webgl::{Gl, WebGLProgram, WebGLUniformLocation};
use tracing::{debug, warn};

use crate::error::{GlKitError, Result};
use crate::glsl::GlslType;
use crate::types::Precision;
use crate::uniform::UniformValue;

// ==================== Scanner ====================

/// Storage qualifier a declaration is scanned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    In,
    Uniform,
}

impl Qualifier {
    fn keyword(self) -> &'static str {
        match self {
            Qualifier::In => "in",
            Qualifier::Uniform => "uniform",
        }
    }
}

/// One scanned declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub ty: GlslType,
    pub location: Option<u32>,
    pub array_size: usize,
    pub precision: Option<Precision>,
    /// 1-based source line.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Ident(&'a str),
    Number(u32),
    Punct(char),
}

fn tokenize(line: &str) -> Option<Vec<Token<'_>>> {
    let code = match line.find("//") {
        Some(pos) => &line[..pos],
        None => line,
    };
    let mut tokens = Vec::new();
    let mut chars = code.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_alphabetic() || c == '_' {
            let mut end = start;
            while let Some(&(i, c)) = chars.peek() {
                if !(c.is_ascii_alphanumeric() || c == '_') {
                    break;
                }
                end = i + c.len_utf8();
                chars.next();
            }
            tokens.push(Token::Ident(&code[start..end]));
        } else if c.is_ascii_digit() {
            let mut end = start;
            while let Some(&(i, c)) = chars.peek() {
                if !c.is_ascii_digit() {
                    break;
                }
                end = i + 1;
                chars.next();
            }
            tokens.push(Token::Number(code[start..end].parse().ok()?));
        } else {
            tokens.push(Token::Punct(c));
            chars.next();
        }
    }
    Some(tokens)
}

struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
}

impl<'t, 'a> Parser<'t, 'a> {
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token<'a>> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn punct(&mut self, expected: char) -> Option<()> {
        match self.next()? {
            Token::Punct(c) if *c == expected => Some(()),
            _ => None,
        }
    }

    fn ident(&mut self) -> Option<&'a str> {
        match self.next()? {
            Token::Ident(word) => Some(*word),
            _ => None,
        }
    }

    fn number(&mut self) -> Option<u32> {
        match self.next()? {
            Token::Number(n) => Some(*n),
            _ => None,
        }
    }

    fn keyword(&mut self, expected: &str) -> Option<()> {
        (self.ident()? == expected).then_some(())
    }

    fn precision(&mut self) -> Option<Precision> {
        match self.peek() {
            Some(Token::Ident(word)) => {
                let precision = Precision::from_keyword(word)?;
                self.pos += 1;
                Some(precision)
            }
            _ => None,
        }
    }

    fn layout_location(&mut self) -> Option<Option<u32>> {
        if self.peek() != Some(&Token::Ident("layout")) {
            return Some(None);
        }
        self.pos += 1;
        self.punct('(')?;
        self.keyword("location")?;
        self.punct('=')?;
        let location = self.number()?;
        self.punct(')')?;
        Some(Some(location))
    }

    fn declaration(&mut self, qualifier: Qualifier, line: usize) -> Option<Declaration> {
        let location = self.layout_location()?;
        let leading = self.precision();
        self.keyword(qualifier.keyword())?;
        let precision = self.precision().or(leading);
        let ty = GlslType::from_keyword(self.ident()?)?;
        let name = self.ident()?.to_string();
        let array_size = if self.peek() == Some(&Token::Punct('[')) {
            self.pos += 1;
            let size = self.number()?;
            self.punct(']')?;
            size as usize
        } else {
            1
        };
        self.punct(';')?;
        if array_size == 0 {
            return None;
        }
        Some(Declaration {
            name,
            ty,
            location,
            array_size,
            precision,
            line,
        })
    }
}

/// Scan `source` for single-line `in` or `uniform` declarations.
pub fn scan(source: &str, qualifier: Qualifier) -> Vec<Declaration> {
    source
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let tokens = tokenize(line)?;
            Parser { tokens: &tokens, pos: 0 }.declaration(qualifier, index + 1)
        })
        .collect()
}

// ==================== Discovery ====================

/// An active vertex input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    pub ty: GlslType,
    /// First location; matrices continue into the following slots.
    pub location: u32,
    pub precision: Option<Precision>,
}

/// An active uniform and its last uploaded value.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformInfo {
    pub ty: GlslType,
    pub location: WebGLUniformLocation,
    pub array_size: usize,
    pub value: UniformValue,
    pub precision: Option<Precision>,
}

impl UniformInfo {
    /// First texture unit of a sampler uniform.
    pub fn unit(&self) -> Option<u32> {
        if !self.ty.is_sampler() {
            return None;
        }
        self.value.to_u32().first().copied()
    }
}

/// Find the active attributes of a linked program.
pub fn discover_attributes<G: Gl>(
    gl: &G,
    program: WebGLProgram,
    vertex_source: &str,
) -> BTreeMap<String, AttributeInfo> {
    let mut attributes = BTreeMap::new();
    for decl in scan(vertex_source, Qualifier::In) {
        let actual = gl.get_attrib_location(program, &decl.name);
        if actual < 0 {
            debug!(attribute = %decl.name, line = decl.line, "attribute is not active, skipping");
            continue;
        }
        let actual = actual as u32;
        if let Some(declared) = decl.location.filter(|declared| *declared != actual) {
            warn!(
                attribute = %decl.name,
                declared,
                actual,
                "attribute location differs from its layout qualifier"
            );
        }
        attributes.insert(
            decl.name,
            AttributeInfo {
                ty: decl.ty,
                location: actual,
                precision: decl.precision,
            },
        );
    }
    attributes
}

/// Find the active uniforms of a linked program and settle their values.
///
/// `explicit` values replace the defaults and must name active uniforms.
/// Sampler uniforms with an explicit value keep that unit; the rest take the
/// lowest free units in declaration order once every explicit unit is known.
pub fn discover_uniforms<G: Gl>(
    gl: &G,
    program: WebGLProgram,
    program_name: &str,
    vertex_source: &str,
    fragment_source: &str,
    explicit: &[(&str, UniformValue)],
    max_texture_units: u32,
) -> Result<BTreeMap<String, UniformInfo>> {
    let mut declarations: Vec<Declaration> = Vec::new();
    for decl in scan(vertex_source, Qualifier::Uniform)
        .into_iter()
        .chain(scan(fragment_source, Qualifier::Uniform))
    {
        if !declarations.iter().any(|d| d.name == decl.name) {
            declarations.push(decl);
        }
    }

    let mut active: Vec<(Declaration, WebGLUniformLocation)> = Vec::new();
    for decl in declarations {
        match gl.get_uniform_location(program, &decl.name) {
            Some(location) => active.push((decl, location)),
            None => debug!(uniform = %decl.name, line = decl.line, "uniform is not active, skipping"),
        }
    }

    for (name, _) in explicit {
        if !active.iter().any(|(d, _)| d.name == *name) {
            return Err(GlKitError::UnknownUniform {
                program: program_name.to_string(),
                name: name.to_string(),
            });
        }
    }
    let explicit_value = |name: &str| explicit.iter().find(|(n, _)| *n == name).map(|(_, v)| v);

    let mut uniforms = BTreeMap::new();
    let mut reserved: BTreeSet<u32> = BTreeSet::new();
    let mut pending_samplers: Vec<(Declaration, WebGLUniformLocation)> = Vec::new();

    for (decl, location) in active {
        let value = match explicit_value(&decl.name) {
            Some(value) => value.clone().conform(decl.ty, decl.array_size).map_err(|reason| {
                GlKitError::validation(format!(
                    "uniform '{}' of program '{}': {}",
                    decl.name, program_name, reason
                ))
            })?,
            None if decl.ty.is_sampler() => {
                pending_samplers.push((decl, location));
                continue;
            }
            None => UniformValue::default_for(decl.ty, decl.array_size),
        };

        if decl.ty.is_sampler() {
            for unit in value.to_i32() {
                if unit < 0 || unit as u32 >= max_texture_units {
                    return Err(GlKitError::validation(format!(
                        "sampler '{}' of program '{}' asks for texture unit {}, but only {} exist",
                        decl.name, program_name, unit, max_texture_units
                    )));
                }
                reserved.insert(unit as u32);
            }
        }

        uniforms.insert(
            decl.name,
            UniformInfo {
                ty: decl.ty,
                location,
                array_size: decl.array_size,
                value,
                precision: decl.precision,
            },
        );
    }

    let mut next_unit = 0u32;
    for (decl, location) in pending_samplers {
        let mut units = Vec::with_capacity(decl.array_size);
        for _ in 0..decl.array_size {
            while reserved.contains(&next_unit) {
                next_unit += 1;
            }
            if next_unit >= max_texture_units {
                let needed = reserved.len() + decl.array_size - units.len();
                return Err(GlKitError::TextureUnitsExhausted {
                    program: program_name.to_string(),
                    needed,
                    available: max_texture_units,
                });
            }
            reserved.insert(next_unit);
            units.push(next_unit as i32);
        }
        debug!(uniform = %decl.name, ?units, "assigned texture units");
        uniforms.insert(
            decl.name,
            UniformInfo {
                ty: decl.ty,
                location,
                array_size: decl.array_size,
                value: UniformValue::Int(units),
                precision: decl.precision,
            },
        );
    }

    Ok(uniforms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glkit_webgl::{constants, SoftwareGl};

    fn link(gl: &mut SoftwareGl, vs: &str, fs: &str) -> WebGLProgram {
        let v = gl.create_shader(constants::VERTEX_SHADER).unwrap();
        gl.shader_source(v, vs);
        gl.compile_shader(v);
        let f = gl.create_shader(constants::FRAGMENT_SHADER).unwrap();
        gl.shader_source(f, fs);
        gl.compile_shader(f);
        let p = gl.create_program().unwrap();
        gl.attach_shader(p, v);
        gl.attach_shader(p, f);
        gl.link_program(p);
        assert!(gl.get_program_link_status(p));
        p
    }

    #[test]
    fn test_scan_full_grammar() {
        let source = "  layout(location = 3) in highp vec4 a_color; // tint\n\
                      in vec2 a_uv;\n\
                      uniform mediump sampler2D u_tex[4];\n\
                      out vec4 v_color;\n";
        let ins = scan(source, Qualifier::In);
        assert_eq!(ins.len(), 2);
        assert_eq!(ins[0].name, "a_color");
        assert_eq!(ins[0].location, Some(3));
        assert_eq!(ins[0].precision, Some(Precision::High));
        assert_eq!(ins[0].line, 1);
        assert_eq!(ins[1].location, None);

        let uniforms = scan(source, Qualifier::Uniform);
        assert_eq!(uniforms.len(), 1);
        assert_eq!(uniforms[0].ty, GlslType::Sampler2D);
        assert_eq!(uniforms[0].array_size, 4);
        assert_eq!(uniforms[0].precision, Some(Precision::Medium));
    }

    #[test]
    fn test_scan_precision_before_qualifier() {
        let decls = scan("lowp uniform float u_t;", Qualifier::Uniform);
        assert_eq!(decls[0].precision, Some(Precision::Low));
    }

    #[test]
    fn test_scan_ignores_other_lines() {
        let source = "uniform Lights { vec4 pos; };\n\
                      uniform vec3\n  u_split;\n\
                      // uniform float u_commented;\n\
                      uniform float u_no_semicolon\n\
                      uniform struct_t u_custom;\n\
                      for (int i = 0; i < 4; i++) {}\n";
        assert!(scan(source, Qualifier::Uniform).is_empty());
        assert!(scan(source, Qualifier::In).is_empty());
    }

    #[test]
    fn test_discover_attributes_skips_inactive() {
        let mut gl = SoftwareGl::new();
        let vs = "in vec2 a_pos;\nin vec3 a_dead;\nvoid main() { gl_Position = vec4(a_pos, 0.0, 1.0); }";
        let fs = "out vec4 c;\nvoid main() { c = vec4(1.0); }";
        let program = link(&mut gl, vs, fs);

        let attributes = discover_attributes(&gl, program, vs);
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes["a_pos"].location, 0);
    }

    #[test]
    fn test_actual_location_wins() {
        let mut gl = SoftwareGl::new();
        gl.remap_attribute("a_pos", 5);
        let vs = "layout(location = 0) in vec2 a_pos;\nvoid main() { gl_Position = vec4(a_pos, 0.0, 1.0); }";
        let fs = "out vec4 c;\nvoid main() { c = vec4(1.0); }";
        let program = link(&mut gl, vs, fs);

        let attributes = discover_attributes(&gl, program, vs);
        assert_eq!(attributes["a_pos"].location, 5);
    }

    const SAMPLER_VS: &str = "uniform mat4 u_mvp;\nin vec2 a_pos;\n\
        void main() { gl_Position = u_mvp * vec4(a_pos, 0.0, 1.0); }";
    const SAMPLER_FS: &str = "uniform sampler2D u_albedo;\nuniform samplerCube u_env;\n\
        uniform sampler2D u_normal;\nuniform mat4 u_mvp;\nout vec4 c;\n\
        void main() { c = texture(u_albedo, vec2(0.0)) + texture(u_env, vec3(0.0)) + texture(u_normal, vec2(0.0)); }";

    #[test]
    fn test_samplers_fill_around_explicit_units() {
        let mut gl = SoftwareGl::new();
        let program = link(&mut gl, SAMPLER_VS, SAMPLER_FS);

        let uniforms = discover_uniforms(
            &gl,
            program,
            "lit",
            SAMPLER_VS,
            SAMPLER_FS,
            &[("u_env", UniformValue::from(0i32))],
            8,
        )
        .unwrap();

        assert_eq!(uniforms["u_env"].unit(), Some(0));
        assert_eq!(uniforms["u_albedo"].unit(), Some(1));
        assert_eq!(uniforms["u_normal"].unit(), Some(2));
        // declared in both stages, kept once with the identity default
        assert_eq!(uniforms["u_mvp"].value, UniformValue::default_for(GlslType::Mat4, 1));
        assert_eq!(uniforms.len(), 4);
    }

    #[test]
    fn test_texture_units_exhausted() {
        let mut gl = SoftwareGl::new();
        let program = link(&mut gl, SAMPLER_VS, SAMPLER_FS);

        let err = discover_uniforms(&gl, program, "lit", SAMPLER_VS, SAMPLER_FS, &[], 2).unwrap_err();
        assert!(matches!(err, GlKitError::TextureUnitsExhausted { available: 2, .. }));
    }

    #[test]
    fn test_explicit_unit_out_of_range() {
        let mut gl = SoftwareGl::new();
        let program = link(&mut gl, SAMPLER_VS, SAMPLER_FS);

        let err = discover_uniforms(
            &gl,
            program,
            "lit",
            SAMPLER_VS,
            SAMPLER_FS,
            &[("u_env", UniformValue::from(9i32))],
            8,
        )
        .unwrap_err();
        assert!(err.to_string().contains("u_env"));
    }

    #[test]
    fn test_unknown_explicit_uniform() {
        let mut gl = SoftwareGl::new();
        let program = link(&mut gl, SAMPLER_VS, SAMPLER_FS);

        let err = discover_uniforms(
            &gl,
            program,
            "lit",
            SAMPLER_VS,
            SAMPLER_FS,
            &[("u_mpv", UniformValue::from(1.0f32))],
            8,
        )
        .unwrap_err();
        assert_eq!(
            err,
            GlKitError::UnknownUniform {
                program: "lit".into(),
                name: "u_mpv".into()
            }
        );
    }
}
