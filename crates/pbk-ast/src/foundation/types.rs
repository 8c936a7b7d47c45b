//! The Pixel Bender value type lattice.
//!
//! Every expression the translator sees has exactly one of these types.
//! Vectors and matrices are fixed-width; matrices are square and float-only.
//! `pixelN` is spelled as a vector (`pixel1` collapses to `float`).

use serde::Serialize;
use std::fmt;

/// Element kind of scalars and vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Scalar {
    Bool,
    Int,
    Float,
}

impl Scalar {
    pub fn name(self) -> &'static str {
        match self {
            Scalar::Bool => "bool",
            Scalar::Int => "int",
            Scalar::Float => "float",
        }
    }
}

/// A Pixel Bender type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Type {
    Bool,
    Int,
    Float,
    /// `bool2`..`bool4`, `int2`..`int4`, `float2`..`float4`
    Vector(Scalar, u8),
    /// `float2x2`..`float4x4`
    Matrix(u8),
    /// `image1`..`image4`, by channel count
    Image(u8),
    Region,
    ImageRef,
    String,
    Void,
    /// Placeholder bound to macro parameters while the translator checks
    /// whether a macro body can become a generic function. Never produced by
    /// the parser.
    Any,
}

impl Type {
    pub fn scalar(scalar: Scalar) -> Type {
        match scalar {
            Scalar::Bool => Type::Bool,
            Scalar::Int => Type::Int,
            Scalar::Float => Type::Float,
        }
    }

    /// Vector of `width` elements; width 1 is the scalar itself.
    pub fn vector(scalar: Scalar, width: u8) -> Type {
        if width <= 1 {
            Type::scalar(scalar)
        } else {
            Type::Vector(scalar, width)
        }
    }

    /// The value type of a pixel with `channels` channels.
    pub fn pixel(channels: u8) -> Type {
        Type::vector(Scalar::Float, channels)
    }

    /// Scalar base of a scalar or vector type.
    pub fn element(&self) -> Option<Scalar> {
        match self {
            Type::Bool => Some(Scalar::Bool),
            Type::Int => Some(Scalar::Int),
            Type::Float => Some(Scalar::Float),
            Type::Vector(scalar, _) => Some(*scalar),
            Type::Matrix(_) => Some(Scalar::Float),
            _ => None,
        }
    }

    /// Number of components: 1 for scalars, N for vectors and `NxN` matrices'
    /// columns. Zero for non-value types.
    pub fn width(&self) -> u8 {
        match self {
            Type::Bool | Type::Int | Type::Float => 1,
            Type::Vector(_, n) | Type::Matrix(n) => *n,
            _ => 0,
        }
    }

    /// Same shape with a different element kind (scalars and vectors only).
    pub fn with_element(&self, scalar: Scalar) -> Type {
        match self {
            Type::Vector(_, n) => Type::Vector(scalar, *n),
            _ => Type::scalar(scalar),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Bool | Type::Int | Type::Float)
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Type::Vector(..))
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, Type::Matrix(_))
    }

    /// Scalars and vectors of int or float.
    pub fn is_numeric(&self) -> bool {
        matches!(self.element(), Some(Scalar::Int | Scalar::Float)) && !self.is_matrix()
    }

    /// Types a function signature may mention without the function being
    /// skipped.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Type::Region | Type::ImageRef)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => f.write_str("bool"),
            Type::Int => f.write_str("int"),
            Type::Float => f.write_str("float"),
            Type::Vector(scalar, n) => write!(f, "{}{}", scalar.name(), n),
            Type::Matrix(n) => write!(f, "float{n}x{n}"),
            Type::Image(n) => write!(f, "image{n}"),
            Type::Region => f.write_str("region"),
            Type::ImageRef => f.write_str("imageRef"),
            Type::String => f.write_str("string"),
            Type::Void => f.write_str("void"),
            Type::Any => f.write_str("any"),
        }
    }
}
