//! Interleaved vertex layout and binary encoding.
//!
//! An [`AttributeSet`] names per-vertex attributes in the order they should
//! appear inside one vertex. [`encode`] computes offsets and the stride, then
//! writes every vertex's scalars little-endian into one packed buffer.

use half::f16;

use crate::error::{GlKitError, Result};
use crate::types::ScalarType;

/// WebGL rejects larger strides in `vertexAttribPointer`.
pub const MAX_STRIDE: usize = 255;

// ==================== Descriptions ====================

/// Caller-side description of one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDesc {
    /// Flat scalars, `height × width` per vertex.
    pub data: Vec<f64>,
    /// Components per column (1-4).
    pub height: u32,
    /// Columns (1-4); more than one only for matrices.
    pub width: u32,
    pub scalar_type: ScalarType,
    pub normalized: bool,
    /// Instancing divisor; 0 advances per vertex.
    pub divisor: u32,
}

impl AttributeDesc {
    /// Float data with `height` components per vertex.
    pub fn new<T: Into<f64> + Copy>(data: &[T], height: u32) -> Self {
        Self {
            data: data.iter().map(|v| (*v).into()).collect(),
            height,
            width: 1,
            scalar_type: ScalarType::Float,
            normalized: false,
            divisor: 0,
        }
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn scalar_type(mut self, scalar_type: ScalarType) -> Self {
        self.scalar_type = scalar_type;
        self
    }

    pub fn normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    pub fn divisor(mut self, divisor: u32) -> Self {
        self.divisor = divisor;
        self
    }

    fn scalars_per_vertex(&self) -> usize {
        (self.height * self.width) as usize
    }
}

/// Named attributes in layout order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSet {
    entries: Vec<(String, AttributeDesc)>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute; it is laid out after every attribute added so far.
    pub fn with(mut self, name: impl Into<String>, desc: AttributeDesc) -> Self {
        self.push(name, desc);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, desc: AttributeDesc) {
        self.entries.push((name.into(), desc));
    }

    pub fn get(&self, name: &str) -> Option<&AttributeDesc> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeDesc)> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, AttributeDesc)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (S, AttributeDesc)>>(iter: I) -> Self {
        let mut set = AttributeSet::new();
        for (name, desc) in iter {
            set.push(name, desc);
        }
        set
    }
}

// ==================== Layout ====================

/// Where one attribute lives inside a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeLayout {
    pub scalar_type: ScalarType,
    pub height: u32,
    pub width: u32,
    pub normalized: bool,
    pub divisor: u32,
    /// Byte offset from the start of the vertex.
    pub offset: usize,
    pub byte_size: usize,
}

impl AttributeLayout {
    /// Byte offset of matrix column `column`.
    pub fn column_offset(&self, column: u32) -> usize {
        self.offset + (column * self.height) as usize * self.scalar_type.byte_size()
    }

    /// The `size` argument for `vertexAttribPointer`.
    pub fn pointer_size(&self) -> i32 {
        if self.scalar_type.is_packed() {
            4
        } else {
            self.height as i32
        }
    }

    /// Same shape and type; offsets may differ.
    pub fn same_format(&self, other: &AttributeLayout) -> bool {
        self.scalar_type == other.scalar_type
            && self.height == other.height
            && self.width == other.width
            && self.normalized == other.normalized
            && self.divisor == other.divisor
    }
}

/// Output of [`encode`].
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedAttributes {
    pub bytes: Vec<u8>,
    /// In layout order.
    pub layout: Vec<(String, AttributeLayout)>,
    pub vertex_count: usize,
    pub stride: usize,
}

impl EncodedAttributes {
    pub fn attribute(&self, name: &str) -> Option<&AttributeLayout> {
        self.layout.iter().find(|(n, _)| n == name).map(|(_, l)| l)
    }

    /// Decode the scalars of one attribute for one vertex.
    ///
    /// Packed attributes decode to their raw (unnormalized) channel values.
    pub fn read(&self, name: &str, vertex: usize) -> Option<Vec<f64>> {
        let layout = self.attribute(name)?;
        if vertex >= self.vertex_count {
            return None;
        }
        let base = vertex * self.stride + layout.offset;
        let size = layout.scalar_type.byte_size();
        if layout.scalar_type.is_packed() {
            let word = u32::from_le_bytes(self.bytes.get(base..base + 4)?.try_into().ok()?);
            return Some(unpack_2_10_10_10(word, layout.scalar_type.is_signed()).to_vec());
        }
        (0..(layout.height * layout.width) as usize)
            .map(|i| {
                let start = base + i * size;
                read_scalar(layout.scalar_type, self.bytes.get(start..start + size)?)
            })
            .collect()
    }
}

// ==================== Encoding ====================

/// Lay out and serialize `attributes` for the buffer named `buffer`.
pub fn encode(buffer: &str, attributes: &AttributeSet) -> Result<EncodedAttributes> {
    let invalid = |attribute: &str, reason: String| GlKitError::InvalidAttributeData {
        buffer: buffer.to_string(),
        attribute: attribute.to_string(),
        reason,
    };

    if attributes.is_empty() {
        return Err(invalid("", "no attributes given".to_string()));
    }

    let mut layout: Vec<(String, AttributeLayout)> = Vec::with_capacity(attributes.len());
    let mut vertex_count: Option<(usize, &str)> = None;
    let mut offset = 0;

    for (name, desc) in attributes.iter() {
        if layout.iter().any(|(n, _)| n == name) {
            return Err(invalid(name, "attribute listed twice".to_string()));
        }
        if !(1..=4).contains(&desc.height) || !(1..=4).contains(&desc.width) {
            return Err(invalid(
                name,
                format!("height {} and width {} must be 1-4", desc.height, desc.width),
            ));
        }
        if desc.scalar_type.is_packed() && (desc.width != 1 || !(3..=4).contains(&desc.height)) {
            return Err(invalid(
                name,
                "packed 2_10_10_10 data needs height 3 or 4 and width 1".to_string(),
            ));
        }
        let per_vertex = desc.scalars_per_vertex();
        if desc.data.is_empty() {
            return Err(invalid(name, "no data".to_string()));
        }
        if desc.data.len() % per_vertex != 0 {
            return Err(invalid(
                name,
                format!(
                    "{} scalars is not a multiple of height × width = {}",
                    desc.data.len(),
                    per_vertex
                ),
            ));
        }
        let count = desc.data.len() / per_vertex;
        match vertex_count {
            Some((expected, first)) if expected != count => {
                return Err(invalid(
                    name,
                    format!("{count} vertices, but '{first}' has {expected}"),
                ));
            }
            Some(_) => {}
            None => vertex_count = Some((count, name)),
        }

        let byte_size = if desc.scalar_type.is_packed() {
            4
        } else {
            per_vertex * desc.scalar_type.byte_size()
        };
        layout.push((
            name.to_string(),
            AttributeLayout {
                scalar_type: desc.scalar_type,
                height: desc.height,
                width: desc.width,
                normalized: desc.normalized,
                divisor: desc.divisor,
                offset,
                byte_size,
            },
        ));
        offset += byte_size;
    }

    let stride = offset;
    if stride > MAX_STRIDE {
        return Err(GlKitError::validation(format!(
            "buffer '{buffer}' has a {stride}-byte stride, over the {MAX_STRIDE}-byte limit"
        )));
    }

    let vertex_count = vertex_count.map(|(count, _)| count).unwrap_or(0);
    let mut bytes = vec![0u8; vertex_count * stride];

    for ((_, layout), (_, desc)) in layout.iter().zip(attributes.iter()) {
        let per_vertex = desc.scalars_per_vertex();
        for (vertex, scalars) in desc.data.chunks_exact(per_vertex).enumerate() {
            let base = vertex * stride + layout.offset;
            if layout.scalar_type.is_packed() {
                let word = pack_2_10_10_10(scalars, layout.scalar_type.is_signed(), layout.normalized);
                bytes[base..base + 4].copy_from_slice(&word.to_le_bytes());
                continue;
            }
            let size = layout.scalar_type.byte_size();
            for (i, value) in scalars.iter().enumerate() {
                let start = base + i * size;
                write_scalar(layout.scalar_type, *value, &mut bytes[start..start + size]);
            }
        }
    }

    Ok(EncodedAttributes {
        bytes,
        layout,
        vertex_count,
        stride,
    })
}

fn write_scalar(scalar_type: ScalarType, value: f64, out: &mut [u8]) {
    match scalar_type {
        ScalarType::Byte => out.copy_from_slice(&(value as i8).to_le_bytes()),
        ScalarType::UnsignedByte => out.copy_from_slice(&(value as u8).to_le_bytes()),
        ScalarType::Short => out.copy_from_slice(&(value as i16).to_le_bytes()),
        ScalarType::UnsignedShort => out.copy_from_slice(&(value as u16).to_le_bytes()),
        ScalarType::Int => out.copy_from_slice(&(value as i32).to_le_bytes()),
        ScalarType::UnsignedInt => out.copy_from_slice(&(value as u32).to_le_bytes()),
        ScalarType::HalfFloat => out.copy_from_slice(&f16::from_f64(value).to_le_bytes()),
        ScalarType::Float => out.copy_from_slice(&(value as f32).to_le_bytes()),
        ScalarType::Int2_10_10_10Rev | ScalarType::UnsignedInt2_10_10_10Rev => {
            out.copy_from_slice(&(value as u32).to_le_bytes())
        }
    }
}

fn read_scalar(scalar_type: ScalarType, bytes: &[u8]) -> Option<f64> {
    Some(match scalar_type {
        ScalarType::Byte => i8::from_le_bytes(bytes.try_into().ok()?) as f64,
        ScalarType::UnsignedByte => u8::from_le_bytes(bytes.try_into().ok()?) as f64,
        ScalarType::Short => i16::from_le_bytes(bytes.try_into().ok()?) as f64,
        ScalarType::UnsignedShort => u16::from_le_bytes(bytes.try_into().ok()?) as f64,
        ScalarType::Int => i32::from_le_bytes(bytes.try_into().ok()?) as f64,
        ScalarType::UnsignedInt
        | ScalarType::Int2_10_10_10Rev
        | ScalarType::UnsignedInt2_10_10_10Rev => u32::from_le_bytes(bytes.try_into().ok()?) as f64,
        ScalarType::HalfFloat => f16::from_le_bytes(bytes.try_into().ok()?).to_f64(),
        ScalarType::Float => f32::from_le_bytes(bytes.try_into().ok()?) as f64,
    })
}

// ==================== Packed 2_10_10_10 ====================

/// Pack x, y, z (10 bits each) and w (2 bits) into one word, x lowest.
///
/// A missing w is 1.0. Normalized channels are scaled to the full range of
/// their bit width; others are rounded. Everything is clamped first.
fn pack_2_10_10_10(channels: &[f64], signed: bool, normalized: bool) -> u32 {
    let channel = |i: usize| channels.get(i).copied().unwrap_or(1.0);
    let encode = |value: f64, bits: u32| -> u32 {
        let mask = (1u32 << bits) - 1;
        let quantized = if signed {
            let max = ((1i64 << (bits - 1)) - 1) as f64;
            let min = -max - 1.0;
            let v = if normalized {
                (value.clamp(-1.0, 1.0) * max).round()
            } else {
                value.round().clamp(min, max)
            };
            v as i32 as u32
        } else {
            let max = mask as f64;
            let v = if normalized {
                (value.clamp(0.0, 1.0) * max).round()
            } else {
                value.round().clamp(0.0, max)
            };
            v as u32
        };
        quantized & mask
    };
    encode(channel(0), 10)
        | (encode(channel(1), 10) << 10)
        | (encode(channel(2), 10) << 20)
        | (encode(channel(3), 2) << 30)
}

fn unpack_2_10_10_10(word: u32, signed: bool) -> [f64; 4] {
    let field = |shift: u32, bits: u32| -> f64 {
        let raw = (word >> shift) & ((1u32 << bits) - 1);
        if signed {
            // sign-extend
            (((raw << (32 - bits)) as i32) >> (32 - bits)) as f64
        } else {
            raw as f64
        }
    };
    [field(0, 10), field(10, 10), field(20, 10), field(30, 2)]
}
