//! Uniform values.

use glkit_webgl::{Gl, WebGLUniformLocation};

use crate::glsl::{GlslType, ScalarKind, UploadShape};

/// A uniform value as a flat component array.
///
/// Vectors and matrices are flattened in the order `uniformMatrix*fv`
/// receives them; arrays of N elements hold N times the components of one
/// element.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(Vec<f32>),
    Int(Vec<i32>),
    Uint(Vec<u32>),
    Bool(Vec<bool>),
}

impl UniformValue {
    pub fn len(&self) -> usize {
        match self {
            UniformValue::Float(v) => v.len(),
            UniformValue::Int(v) => v.len(),
            UniformValue::Uint(v) => v.len(),
            UniformValue::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The value a freshly linked program gets for a declaration.
    ///
    /// Zero for scalars, vectors and samplers. Matrices get the identity,
    /// written row by row for the declared rows and columns, tiled across
    /// arrays.
    pub fn default_for(ty: GlslType, array_size: usize) -> Self {
        let count = ty.components() * array_size;
        match ty.scalar_kind() {
            ScalarKind::Float => match ty.matrix_dims() {
                Some((columns, rows)) => {
                    let mut element = vec![0.0; (columns * rows) as usize];
                    // 1s at (r, r) of the row-major logical layout
                    for r in 0..columns.min(rows) {
                        element[(r * (columns + 1)) as usize] = 1.0;
                    }
                    UniformValue::Float(element.repeat(array_size))
                }
                None => UniformValue::Float(vec![0.0; count]),
            },
            ScalarKind::Int => UniformValue::Int(vec![0; count]),
            ScalarKind::Uint => UniformValue::Uint(vec![0; count]),
            ScalarKind::Bool => UniformValue::Bool(vec![false; count]),
        }
    }

    /// Convert to the variant `ty` stores, checking the component count.
    ///
    /// Floats truncate toward zero when stored as integers; anything
    /// non-zero becomes `true`.
    pub fn conform(self, ty: GlslType, array_size: usize) -> Result<Self, String> {
        let expected = ty.components() * array_size;
        if self.len() != expected {
            return Err(format!(
                "expected {expected} components for {ty:?}[{array_size}], got {}",
                self.len()
            ));
        }
        Ok(match ty.scalar_kind() {
            ScalarKind::Float => UniformValue::Float(self.to_f32()),
            ScalarKind::Int => UniformValue::Int(self.to_i32()),
            ScalarKind::Uint => UniformValue::Uint(self.to_u32()),
            ScalarKind::Bool => UniformValue::Bool(self.to_bool()),
        })
    }

    pub fn to_f32(&self) -> Vec<f32> {
        match self {
            UniformValue::Float(v) => v.clone(),
            UniformValue::Int(v) => v.iter().map(|x| *x as f32).collect(),
            UniformValue::Uint(v) => v.iter().map(|x| *x as f32).collect(),
            UniformValue::Bool(v) => v.iter().map(|x| if *x { 1.0 } else { 0.0 }).collect(),
        }
    }

    pub fn to_i32(&self) -> Vec<i32> {
        match self {
            UniformValue::Float(v) => v.iter().map(|x| x.trunc() as i32).collect(),
            UniformValue::Int(v) => v.clone(),
            UniformValue::Uint(v) => v.iter().map(|x| *x as i32).collect(),
            UniformValue::Bool(v) => v.iter().map(|x| i32::from(*x)).collect(),
        }
    }

    pub fn to_u32(&self) -> Vec<u32> {
        match self {
            UniformValue::Float(v) => v.iter().map(|x| x.trunc() as u32).collect(),
            UniformValue::Int(v) => v.iter().map(|x| *x as u32).collect(),
            UniformValue::Uint(v) => v.clone(),
            UniformValue::Bool(v) => v.iter().map(|x| u32::from(*x)).collect(),
        }
    }

    pub fn to_bool(&self) -> Vec<bool> {
        match self {
            UniformValue::Float(v) => v.iter().map(|x| *x != 0.0).collect(),
            UniformValue::Int(v) => v.iter().map(|x| *x != 0).collect(),
            UniformValue::Uint(v) => v.iter().map(|x| *x != 0).collect(),
            UniformValue::Bool(v) => v.clone(),
        }
    }
}

/// Issue the `uniform*` call matching the declared type.
pub(crate) fn upload<G: Gl>(gl: &mut G, location: WebGLUniformLocation, ty: GlslType, value: &UniformValue) {
    match ty.upload_shape() {
        UploadShape::Float(width) => gl.uniform_fv(location, width, &value.to_f32()),
        UploadShape::Int(width) => gl.uniform_iv(location, width, &value.to_i32()),
        UploadShape::Uint(width) => gl.uniform_uiv(location, width, &value.to_u32()),
        UploadShape::Matrix { columns, rows } => {
            gl.uniform_matrix_fv(location, columns, rows, false, &value.to_f32())
        }
    }
}

// ==================== Conversions ====================

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(vec![v])
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(vec![v])
    }
}

impl From<u32> for UniformValue {
    fn from(v: u32) -> Self {
        UniformValue::Uint(vec![v])
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        UniformValue::Bool(vec![v])
    }
}

impl<const N: usize> From<[f32; N]> for UniformValue {
    fn from(v: [f32; N]) -> Self {
        UniformValue::Float(v.to_vec())
    }
}

impl<const N: usize> From<[i32; N]> for UniformValue {
    fn from(v: [i32; N]) -> Self {
        UniformValue::Int(v.to_vec())
    }
}

impl<const N: usize> From<[u32; N]> for UniformValue {
    fn from(v: [u32; N]) -> Self {
        UniformValue::Uint(v.to_vec())
    }
}

impl<const N: usize> From<[bool; N]> for UniformValue {
    fn from(v: [bool; N]) -> Self {
        UniformValue::Bool(v.to_vec())
    }
}

impl From<Vec<f32>> for UniformValue {
    fn from(v: Vec<f32>) -> Self {
        UniformValue::Float(v)
    }
}

impl From<Vec<i32>> for UniformValue {
    fn from(v: Vec<i32>) -> Self {
        UniformValue::Int(v)
    }
}

impl From<Vec<u32>> for UniformValue {
    fn from(v: Vec<u32>) -> Self {
        UniformValue::Uint(v)
    }
}

impl From<Vec<bool>> for UniformValue {
    fn from(v: Vec<bool>) -> Self {
        UniformValue::Bool(v)
    }
}

impl From<&[f32]> for UniformValue {
    fn from(v: &[f32]) -> Self {
        UniformValue::Float(v.to_vec())
    }
}
