//! Binary sample payloads of signal entries.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use tracing::debug;

use crate::EntryError;

/// Element type named by a signal's `dataType` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DataType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

impl DataType {
    pub const fn num_bytes(self) -> usize {
        match self {
            DataType::Int8 | DataType::UInt8 => 1,
            DataType::Int16 | DataType::UInt16 => 2,
            DataType::Int32 | DataType::UInt32 | DataType::Float32 => 4,
            DataType::Int64 | DataType::UInt64 | DataType::Float64 => 8,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            DataType::Int8 => "int8",
            DataType::UInt8 => "uint8",
            DataType::Int16 => "int16",
            DataType::UInt16 => "uint16",
            DataType::Int32 => "int32",
            DataType::UInt32 => "uint32",
            DataType::Int64 => "int64",
            DataType::UInt64 => "uint64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }
}

impl FromStr for DataType {
    type Err = EntryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let data_type = match value.trim().to_ascii_lowercase().as_str() {
            "int8" => DataType::Int8,
            "uint8" => DataType::UInt8,
            "int16" => DataType::Int16,
            "uint16" => DataType::UInt16,
            "int32" => DataType::Int32,
            "uint32" => DataType::UInt32,
            "int64" => DataType::Int64,
            "uint64" => DataType::UInt64,
            "float" | "float32" => DataType::Float32,
            "double" | "float64" => DataType::Float64,
            _ => {
                return Err(EntryError::Validation(format!(
                    "unsupported dataType: {value}"
                )))
            }
        };
        Ok(data_type)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Byte order of a binary payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

impl FromStr for Endianness {
    type Err = EntryError;

    /// Accepts the `binFileFormat@endianess` spellings `LITTLE` and `BIG`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "LITTLE" => Ok(Endianness::Little),
            "BIG" => Ok(Endianness::Big),
            _ => Err(EntryError::Validation(format!(
                "unknown endianness: {value}"
            ))),
        }
    }
}

/// Flat sample array tagged with its element type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum SampleArray {
    Int8(Vec<i8>),
    UInt8(Vec<u8>),
    Int16(Vec<i16>),
    UInt16(Vec<u16>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Int64(Vec<i64>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

macro_rules! each_variant {
    ($array:expr, $values:ident => $body:expr) => {
        match $array {
            SampleArray::Int8($values) => $body,
            SampleArray::UInt8($values) => $body,
            SampleArray::Int16($values) => $body,
            SampleArray::UInt16($values) => $body,
            SampleArray::Int32($values) => $body,
            SampleArray::UInt32($values) => $body,
            SampleArray::Int64($values) => $body,
            SampleArray::UInt64($values) => $body,
            SampleArray::Float32($values) => $body,
            SampleArray::Float64($values) => $body,
        }
    };
}

macro_rules! read_into {
    ($bytes:expr, $order:expr, $ty:ty, $read:ident) => {{
        let mut out: Vec<$ty> = vec![0 as $ty; $bytes.len() / std::mem::size_of::<$ty>()];
        match $order {
            Endianness::Little => LittleEndian::$read($bytes, &mut out),
            Endianness::Big => BigEndian::$read($bytes, &mut out),
        }
        out
    }};
}

macro_rules! scale_each {
    ($values:expr, $lsb:expr, $ty:ty) => {
        $values
            .into_iter()
            .map(|value| (value as f64 * $lsb) as $ty)
            .collect()
    };
}

impl SampleArray {
    pub fn len(&self) -> usize {
        each_variant!(self, values => values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> DataType {
        match self {
            SampleArray::Int8(_) => DataType::Int8,
            SampleArray::UInt8(_) => DataType::UInt8,
            SampleArray::Int16(_) => DataType::Int16,
            SampleArray::UInt16(_) => DataType::UInt16,
            SampleArray::Int32(_) => DataType::Int32,
            SampleArray::UInt32(_) => DataType::UInt32,
            SampleArray::Int64(_) => DataType::Int64,
            SampleArray::UInt64(_) => DataType::UInt64,
            SampleArray::Float32(_) => DataType::Float32,
            SampleArray::Float64(_) => DataType::Float64,
        }
    }

    /// Widen every sample to `f64`.
    pub fn to_f64(&self) -> Vec<f64> {
        each_variant!(self, values => values.iter().map(|&value| value as f64).collect())
    }

    /// Multiply every sample by `lsb` and cast back to the element type.
    ///
    /// Integer types truncate toward zero (and saturate at the type bounds),
    /// so `[1, 2, 3]` scaled by `0.5` yields `[0, 1, 1]`.
    pub fn scale(self, lsb: f64) -> SampleArray {
        match self {
            SampleArray::Int8(v) => SampleArray::Int8(scale_each!(v, lsb, i8)),
            SampleArray::UInt8(v) => SampleArray::UInt8(scale_each!(v, lsb, u8)),
            SampleArray::Int16(v) => SampleArray::Int16(scale_each!(v, lsb, i16)),
            SampleArray::UInt16(v) => SampleArray::UInt16(scale_each!(v, lsb, u16)),
            SampleArray::Int32(v) => SampleArray::Int32(scale_each!(v, lsb, i32)),
            SampleArray::UInt32(v) => SampleArray::UInt32(scale_each!(v, lsb, u32)),
            SampleArray::Int64(v) => SampleArray::Int64(scale_each!(v, lsb, i64)),
            SampleArray::UInt64(v) => SampleArray::UInt64(scale_each!(v, lsb, u64)),
            SampleArray::Float32(v) => SampleArray::Float32(scale_each!(v, lsb, f32)),
            SampleArray::Float64(v) => SampleArray::Float64(scale_each!(v, lsb, f64)),
        }
    }
}

/// Decode raw payload bytes into a flat array of `data_type` elements.
pub fn decode_samples(
    bytes: &[u8],
    data_type: DataType,
    order: Endianness,
) -> Result<SampleArray, EntryError> {
    let width = data_type.num_bytes();
    if bytes.len() % width != 0 {
        return Err(EntryError::Payload(format!(
            "{} bytes is not a whole number of {width}-byte {data_type} samples",
            bytes.len()
        )));
    }
    let samples = match data_type {
        DataType::Int8 => SampleArray::Int8(bytes.iter().map(|&b| b as i8).collect()),
        DataType::UInt8 => SampleArray::UInt8(bytes.to_vec()),
        DataType::Int16 => SampleArray::Int16(read_into!(bytes, order, i16, read_i16_into)),
        DataType::UInt16 => SampleArray::UInt16(read_into!(bytes, order, u16, read_u16_into)),
        DataType::Int32 => SampleArray::Int32(read_into!(bytes, order, i32, read_i32_into)),
        DataType::UInt32 => SampleArray::UInt32(read_into!(bytes, order, u32, read_u32_into)),
        DataType::Int64 => SampleArray::Int64(read_into!(bytes, order, i64, read_i64_into)),
        DataType::UInt64 => SampleArray::UInt64(read_into!(bytes, order, u64, read_u64_into)),
        DataType::Float32 => SampleArray::Float32(read_into!(bytes, order, f32, read_f32_into)),
        DataType::Float64 => SampleArray::Float64(read_into!(bytes, order, f64, read_f64_into)),
    };
    Ok(samples)
}

/// Read a signal payload file, optionally applying the `lsbValue` scale.
pub fn read_samples(
    path: &Path,
    data_type: DataType,
    order: Endianness,
    lsb: Option<f64>,
) -> Result<SampleArray, EntryError> {
    let bytes = std::fs::read(path)
        .map_err(|err| EntryError::Io(format!("{}: {err}", path.display())))?;
    let samples = decode_samples(&bytes, data_type, order)?;
    debug!(
        path = %path.display(),
        %data_type,
        ?order,
        samples = samples.len(),
        scaled = lsb.is_some(),
        "decoded signal payload"
    );
    Ok(match lsb {
        Some(lsb) => samples.scale(lsb),
        None => samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_vocabulary() {
        assert_eq!("int16".parse::<DataType>().unwrap(), DataType::Int16);
        assert_eq!("UINT32".parse::<DataType>().unwrap(), DataType::UInt32);
        assert_eq!("double".parse::<DataType>().unwrap(), DataType::Float64);
        assert_eq!("float".parse::<DataType>().unwrap(), DataType::Float32);
        assert!(matches!(
            "complex64".parse::<DataType>(),
            Err(EntryError::Validation(_))
        ));
    }

    #[test]
    fn decode_little_and_big_endian() {
        let le = [1u8, 0, 2, 0, 0xFF, 0xFF];
        let samples = decode_samples(&le, DataType::Int16, Endianness::Little).unwrap();
        assert_eq!(samples, SampleArray::Int16(vec![1, 2, -1]));
        let be = [0u8, 1, 0, 2];
        let samples = decode_samples(&be, DataType::UInt16, Endianness::Big).unwrap();
        assert_eq!(samples, SampleArray::UInt16(vec![1, 2]));
    }

    #[test]
    fn decode_floats() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1.5f64.to_le_bytes());
        bytes.extend_from_slice(&(-2.0f64).to_le_bytes());
        let samples = decode_samples(&bytes, DataType::Float64, Endianness::Little).unwrap();
        assert_eq!(samples, SampleArray::Float64(vec![1.5, -2.0]));
    }

    #[test]
    fn trailing_partial_sample_is_rejected() {
        let err = decode_samples(&[0, 1, 2], DataType::Int16, Endianness::Little).unwrap_err();
        assert!(matches!(err, EntryError::Payload(_)));
    }

    #[test]
    fn scaling_truncates_back_to_element_type() {
        let scaled = SampleArray::Int16(vec![1, 2, 3]).scale(0.5);
        assert_eq!(scaled, SampleArray::Int16(vec![0, 1, 1]));
        let scaled = SampleArray::Int16(vec![-3]).scale(0.5);
        assert_eq!(scaled, SampleArray::Int16(vec![-1]));
        let scaled = SampleArray::Float32(vec![1.0, 3.0]).scale(0.5);
        assert_eq!(scaled, SampleArray::Float32(vec![0.5, 1.5]));
    }

    #[test]
    fn endianness_spellings() {
        assert_eq!("LITTLE".parse::<Endianness>().unwrap(), Endianness::Little);
        assert_eq!("big".parse::<Endianness>().unwrap(), Endianness::Big);
        assert!("middle".parse::<Endianness>().is_err());
        assert_eq!(Endianness::default(), Endianness::Little);
    }
}
