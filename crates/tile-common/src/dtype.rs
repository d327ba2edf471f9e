//! Raster sample data types and their theoretical value ranges.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};

/// Sample type of a raster band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Uint8,
    Int8,
    Uint16,
    Int16,
    Uint32,
    Int32,
    Uint64,
    Int64,
    Float32,
    Float64,
}

/// Theoretical (min, max) per data type, as published by rasterio.
///
/// Types missing from this table have no dtype-range scaling.
const DTYPE_RANGES: [(DataType, (f64, f64)); 7] = [
    (DataType::Uint8, (0.0, 255.0)),
    (DataType::Uint16, (0.0, 65535.0)),
    (DataType::Int16, (-32768.0, 32767.0)),
    (DataType::Uint32, (0.0, 4294967295.0)),
    (DataType::Int32, (-2147483648.0, 2147483647.0)),
    (DataType::Float32, (-3.4028235e+38, 3.4028235e+38)),
    (
        DataType::Float64,
        (-1.7976931348623157e+308, 1.7976931348623157e+308),
    ),
];

impl DataType {
    /// Look up the theoretical value range of this type.
    pub fn range(&self) -> Option<(f64, f64)> {
        DTYPE_RANGES
            .iter()
            .find(|(dtype, _)| dtype == self)
            .map(|(_, range)| *range)
    }

    pub fn is_uint8(&self) -> bool {
        matches!(self, DataType::Uint8)
    }

    /// Lowercase name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uint8 => "uint8",
            Self::Int8 => "int8",
            Self::Uint16 => "uint16",
            Self::Int16 => "int16",
            Self::Uint32 => "uint32",
            Self::Int32 => "int32",
            Self::Uint64 => "uint64",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }
}

impl std::str::FromStr for DataType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uint8" => Ok(Self::Uint8),
            "int8" => Ok(Self::Int8),
            "uint16" => Ok(Self::Uint16),
            "int16" => Ok(Self::Int16),
            "uint32" => Ok(Self::Uint32),
            "int32" => Ok(Self::Int32),
            "uint64" => Ok(Self::Uint64),
            "int64" => Ok(Self::Int64),
            "float32" => Ok(Self::Float32),
            "float64" => Ok(Self::Float64),
            _ => Err(ParseError::UnknownDataType(s.to_string())),
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_table() {
        assert_eq!(DataType::Uint8.range(), Some((0.0, 255.0)));
        assert_eq!(DataType::Uint16.range(), Some((0.0, 65535.0)));
        assert_eq!(DataType::Int16.range(), Some((-32768.0, 32767.0)));
        assert_eq!(DataType::Uint32.range(), Some((0.0, 4294967295.0)));
        assert_eq!(
            DataType::Int32.range(),
            Some((-2147483648.0, 2147483647.0))
        );
        assert_eq!(
            DataType::Float32.range(),
            Some((-3.4028235e+38, 3.4028235e+38))
        );
        assert_eq!(DataType::Float64.range(), Some((f64::MIN, f64::MAX)));
    }

    #[test]
    fn test_types_without_range() {
        assert_eq!(DataType::Int8.range(), None);
        assert_eq!(DataType::Uint64.range(), None);
        assert_eq!(DataType::Int64.range(), None);
    }

    #[test]
    fn test_parse_roundtrip_names() {
        for name in ["uint8", "int16", "float64", "UINT16"] {
            let dtype: DataType = name.parse().unwrap();
            assert_eq!(dtype.as_str(), name.to_lowercase());
        }
        assert!("complex64".parse::<DataType>().is_err());
    }
}
