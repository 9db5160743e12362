//! Typed element buffers.

use num_traits::{Bounded, NumCast};

use crate::config::Narrowing;
use crate::error::{GridProcessorError, Result};
use crate::slice::SliceSpec;
use crate::types::{DataType, Dimension};

/// A scalar element type storable in a [`DataBuffer`].
pub trait Element: Copy + Send + Sync + 'static {
    const DATA_TYPE: DataType;

    /// Store a floating value, narrowing and saturating for integers.
    fn from_f64(value: f64, narrowing: Narrowing) -> Self;

    fn to_f64(self) -> f64;
}

macro_rules! integer_element {
    ($($t:ty => $dt:ident),* $(,)?) => {$(
        impl Element for $t {
            const DATA_TYPE: DataType = DataType::$dt;

            #[inline]
            fn from_f64(value: f64, narrowing: Narrowing) -> Self {
                saturating_cast::<$t>(narrowing.apply(value))
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    )*};
}

macro_rules! float_element {
    ($($t:ty => $dt:ident),* $(,)?) => {$(
        impl Element for $t {
            const DATA_TYPE: DataType = DataType::$dt;

            #[inline]
            fn from_f64(value: f64, _narrowing: Narrowing) -> Self {
                value as $t
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    )*};
}

integer_element!(
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
);
float_element!(f32 => Float32, f64 => Float64);

/// Clamp into the range of an integer type. NaN becomes zero.
fn saturating_cast<T: NumCast + Bounded + Copy>(value: f64) -> T {
    let min = T::min_value();
    let max = T::max_value();
    if value.is_nan() {
        return NumCast::from(0).unwrap_or(min);
    }
    NumCast::from(value).unwrap_or(if value < 0.0 { min } else { max })
}

/// An owned buffer of elements of one [`DataType`].
#[derive(Debug, Clone, PartialEq)]
pub enum DataBuffer {
    Int8(Vec<i8>),
    UInt8(Vec<u8>),
    Int16(Vec<i16>),
    UInt16(Vec<u16>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

macro_rules! dispatch {
    ($buffer:expr, $v:ident => $body:expr) => {
        match $buffer {
            DataBuffer::Int8($v) => $body,
            DataBuffer::UInt8($v) => $body,
            DataBuffer::Int16($v) => $body,
            DataBuffer::UInt16($v) => $body,
            DataBuffer::Int32($v) => $body,
            DataBuffer::UInt32($v) => $body,
            DataBuffer::Int64($v) => $body,
            DataBuffer::Float32($v) => $body,
            DataBuffer::Float64($v) => $body,
        }
    };
}

macro_rules! build {
    ($data_type:expr, $t:ident => $body:expr) => {
        match $data_type {
            DataType::Int8 => {
                type $t = i8;
                DataBuffer::Int8($body)
            }
            DataType::UInt8 => {
                type $t = u8;
                DataBuffer::UInt8($body)
            }
            DataType::Int16 => {
                type $t = i16;
                DataBuffer::Int16($body)
            }
            DataType::UInt16 => {
                type $t = u16;
                DataBuffer::UInt16($body)
            }
            DataType::Int32 => {
                type $t = i32;
                DataBuffer::Int32($body)
            }
            DataType::UInt32 => {
                type $t = u32;
                DataBuffer::UInt32($body)
            }
            DataType::Int64 => {
                type $t = i64;
                DataBuffer::Int64($body)
            }
            DataType::Float32 => {
                type $t = f32;
                DataBuffer::Float32($body)
            }
            DataType::Float64 => {
                type $t = f64;
                DataBuffer::Float64($body)
            }
        }
    };
}

impl DataBuffer {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Int8(_) => DataType::Int8,
            Self::UInt8(_) => DataType::UInt8,
            Self::Int16(_) => DataType::Int16,
            Self::UInt16(_) => DataType::UInt16,
            Self::Int32(_) => DataType::Int32,
            Self::UInt32(_) => DataType::UInt32,
            Self::Int64(_) => DataType::Int64,
            Self::Float32(_) => DataType::Float32,
            Self::Float64(_) => DataType::Float64,
        }
    }

    pub fn len(&self) -> usize {
        dispatch!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A buffer of `len` copies of `value`.
    pub fn filled(data_type: DataType, len: usize, value: f64) -> Self {
        build!(data_type, T => vec![T::from_f64(value, Narrowing::Round); len])
    }

    /// Store floating values as `data_type`.
    pub fn from_f64(data_type: DataType, values: &[f64], narrowing: Narrowing) -> Self {
        build!(data_type, T => values.iter().map(|&x| T::from_f64(x, narrowing)).collect())
    }

    /// Element `index` as `f64`.
    pub fn get(&self, index: usize) -> Option<f64> {
        dispatch!(self, v => v.get(index).map(|x| x.to_f64()))
    }

    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            Self::Float64(v) => v.clone(),
            _ => dispatch!(self, v => v.iter().map(|x| x.to_f64()).collect()),
        }
    }

    pub fn to_f32_vec(&self) -> Vec<f32> {
        match self {
            Self::Float32(v) => v.clone(),
            _ => dispatch!(self, v => v.iter().map(|x| x.to_f64() as f32).collect()),
        }
    }

    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            Self::Float32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<&[f64]> {
        match self {
            Self::Float64(v) => Some(v),
            _ => None,
        }
    }

    /// Convert to another element type. A no-op clone when the type matches.
    pub fn cast(&self, data_type: DataType, narrowing: Narrowing) -> Self {
        if self.data_type() == data_type {
            return self.clone();
        }
        Self::from_f64(data_type, &self.to_f64_vec(), narrowing)
    }

    /// Grow or shrink to `len`, filling new elements with `fill`.
    pub fn resize(&mut self, len: usize, fill: f64) {
        dispatch!(self, v => v.resize(len, Element::from_f64(fill, Narrowing::Round)))
    }

    /// Copy the region `spec` out of a buffer laid out as `shape`.
    pub fn extract(&self, shape: &[Dimension], spec: &SliceSpec) -> Result<Self> {
        Ok(dispatch!(self, v => spec.extract(shape, v)?.into()))
    }

    /// Write `values` into the region `spec` of a buffer laid out as `shape`.
    ///
    /// `values` must have this buffer's element type.
    pub fn insert(&mut self, shape: &[Dimension], spec: &SliceSpec, values: &DataBuffer) -> Result<()> {
        match (self, values) {
            (Self::Int8(t), Self::Int8(v)) => spec.insert(shape, t, v),
            (Self::UInt8(t), Self::UInt8(v)) => spec.insert(shape, t, v),
            (Self::Int16(t), Self::Int16(v)) => spec.insert(shape, t, v),
            (Self::UInt16(t), Self::UInt16(v)) => spec.insert(shape, t, v),
            (Self::Int32(t), Self::Int32(v)) => spec.insert(shape, t, v),
            (Self::UInt32(t), Self::UInt32(v)) => spec.insert(shape, t, v),
            (Self::Int64(t), Self::Int64(v)) => spec.insert(shape, t, v),
            (Self::Float32(t), Self::Float32(v)) => spec.insert(shape, t, v),
            (Self::Float64(t), Self::Float64(v)) => spec.insert(shape, t, v),
            (target, src) => Err(GridProcessorError::backend(format!(
                "cannot insert {} values into {} buffer",
                src.data_type(),
                target.data_type()
            ))),
        }
    }
}

macro_rules! from_vec {
    ($($t:ty => $variant:ident),* $(,)?) => {$(
        impl From<Vec<$t>> for DataBuffer {
            fn from(values: Vec<$t>) -> Self {
                Self::$variant(values)
            }
        }
    )*};
}

from_vec!(
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
);
