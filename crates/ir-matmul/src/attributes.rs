use std::collections::HashMap;

use crate::error::{MatMulError, Result};

/// A single node attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Int(i64),
    Float(f32),
}

impl AttributeValue {
    /// Returns a human-readable name for the variant (used in error messages).
    fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::Int(_) => "Int",
            AttributeValue::Float(_) => "Float",
        }
    }
}

/// Attributes attached to a graph node, fixed when its kernel is built.
#[derive(Debug, Clone, Default)]
pub struct NodeAttributes {
    pub entries: HashMap<String, AttributeValue>,
}

impl NodeAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: AttributeValue) -> Self {
        self.entries.insert(name.to_string(), value);
        self
    }

    /// Retrieve an integer attribute, or `default` if it is absent.
    pub fn get_int_or(&self, name: &str, default: i64) -> Result<i64> {
        match self.entries.get(name) {
            Some(AttributeValue::Int(v)) => Ok(*v),
            Some(other) => Err(MatMulError::AttributeType {
                name: name.to_string(),
                expected: "Int".to_string(),
                got: other.type_name().to_string(),
            }),
            None => Ok(default),
        }
    }

    /// Retrieve a float attribute, or `default` if it is absent.
    pub fn get_float_or(&self, name: &str, default: f32) -> Result<f32> {
        match self.entries.get(name) {
            Some(AttributeValue::Float(v)) => Ok(*v),
            Some(other) => Err(MatMulError::AttributeType {
                name: name.to_string(),
                expected: "Float".to_string(),
                got: other.type_name().to_string(),
            }),
            None => Ok(default),
        }
    }
}

/// Configuration for the f32 MatMul kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatMulAttributes {
    /// Multiply by the transpose of the left operand's trailing matrix.
    pub trans_a: bool,
    /// Multiply by the transpose of the right operand's trailing matrix.
    pub trans_b: bool,
    /// Scale applied to the product.
    pub alpha: f32,
}

impl Default for MatMulAttributes {
    fn default() -> Self {
        MatMulAttributes {
            trans_a: false,
            trans_b: false,
            alpha: 1.0,
        }
    }
}

impl MatMulAttributes {
    pub fn with_trans_a(mut self, trans_a: bool) -> Self {
        self.trans_a = trans_a;
        self
    }

    pub fn with_trans_b(mut self, trans_b: bool) -> Self {
        self.trans_b = trans_b;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Parse from node attributes.
    ///
    /// Reads the following keys:
    /// - `transA` -> trans_a (int, default 0, non-zero is true)
    /// - `transB` -> trans_b (int, default 0, non-zero is true)
    /// - `alpha` -> alpha (float, default 1.0)
    pub fn from_attributes(attrs: &NodeAttributes) -> Result<MatMulAttributes> {
        Ok(MatMulAttributes {
            trans_a: attrs.get_int_or("transA", 0)? != 0,
            trans_b: attrs.get_int_or("transB", 0)? != 0,
            alpha: attrs.get_float_or("alpha", 1.0)?,
        })
    }
}
