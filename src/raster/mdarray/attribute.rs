use std::cell::RefCell;

use crate::cpl;
use crate::errors::{GdalError, Result};
use crate::raster::mdarray::convert::f64_to_i64;
use crate::raster::ExtendedDataType;

/// Value held by an [`Attribute`].
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    String(String),
    StringArray(Vec<String>),
    Int(i64),
    IntArray(Vec<i64>),
    Double(f64),
    DoubleArray(Vec<f64>),
}

/// A named, typed value attached to a group or an array.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    name: String,
    value: AttributeValue,
}

impl Attribute {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    /// Return the size of the dimensions of the attribute.
    /// This will be an empty array for a scalar (single value) attribute.
    pub fn dimension_sizes(&self) -> Vec<usize> {
        match &self.value {
            AttributeValue::String(_) | AttributeValue::Int(_) | AttributeValue::Double(_) => {
                vec![]
            }
            AttributeValue::StringArray(v) => vec![v.len()],
            AttributeValue::IntArray(v) => vec![v.len()],
            AttributeValue::DoubleArray(v) => vec![v.len()],
        }
    }

    pub fn datatype(&self) -> ExtendedDataType {
        match &self.value {
            AttributeValue::String(_) | AttributeValue::StringArray(_) => {
                ExtendedDataType::create_string(0)
            }
            AttributeValue::Int(_) | AttributeValue::IntArray(_) => ExtendedDataType::of::<i64>(),
            AttributeValue::Double(_) | AttributeValue::DoubleArray(_) => {
                ExtendedDataType::of::<f64>()
            }
        }
    }

    /// First value as a string. Numbers are formatted.
    pub fn read_as_string(&self) -> String {
        self.read_as_string_array()
            .into_iter()
            .next()
            .unwrap_or_default()
    }

    pub fn read_as_string_array(&self) -> Vec<String> {
        match &self.value {
            AttributeValue::String(s) => vec![s.clone()],
            AttributeValue::StringArray(v) => v.clone(),
            AttributeValue::Int(i) => vec![i.to_string()],
            AttributeValue::IntArray(v) => v.iter().map(i64::to_string).collect(),
            AttributeValue::Double(d) => vec![d.to_string()],
            AttributeValue::DoubleArray(v) => v.iter().map(f64::to_string).collect(),
        }
    }

    /// First value as an integer. Strings that do not parse read as 0.
    pub fn read_as_i64(&self) -> i64 {
        self.read_as_i64_array().into_iter().next().unwrap_or(0)
    }

    pub fn read_as_i64_array(&self) -> Vec<i64> {
        self.read_as_f64_array()
            .into_iter()
            .zip(self.exact_ints())
            .map(|(d, exact)| exact.unwrap_or_else(|| f64_to_i64(d)))
            .collect()
    }

    /// First value as a double. Strings that do not parse read as 0.
    pub fn read_as_f64(&self) -> f64 {
        self.read_as_f64_array().into_iter().next().unwrap_or(0.)
    }

    pub fn read_as_f64_array(&self) -> Vec<f64> {
        match &self.value {
            AttributeValue::String(s) => vec![parse_f64(s)],
            AttributeValue::StringArray(v) => v.iter().map(|s| parse_f64(s)).collect(),
            AttributeValue::Int(i) => vec![*i as f64],
            AttributeValue::IntArray(v) => v.iter().map(|i| *i as f64).collect(),
            AttributeValue::Double(d) => vec![*d],
            AttributeValue::DoubleArray(v) => v.clone(),
        }
    }

    /// Integer values that must not take the lossy detour through `f64`.
    fn exact_ints(&self) -> Vec<Option<i64>> {
        match &self.value {
            AttributeValue::Int(i) => vec![Some(*i)],
            AttributeValue::IntArray(v) => v.iter().map(|i| Some(*i)).collect(),
            AttributeValue::String(s) => vec![s.trim().parse().ok()],
            AttributeValue::StringArray(v) => v.iter().map(|s| s.trim().parse().ok()).collect(),
            AttributeValue::Double(_) => vec![None],
            AttributeValue::DoubleArray(v) => vec![None; v.len()],
        }
    }
}

fn parse_f64(s: &str) -> f64 {
    s.trim().parse().unwrap_or(0.)
}

/// Name-keyed attributes in creation order.
#[derive(Debug, Default)]
pub(crate) struct AttributeTable {
    attributes: RefCell<Vec<Attribute>>,
}

impl AttributeTable {
    pub(crate) fn create(&self, name: &str, value: AttributeValue) -> Result<Attribute> {
        if name.is_empty() {
            return Err(cpl::report(GdalError::BadArgument(
                "attribute name must not be empty".to_string(),
            )));
        }
        let mut attributes = self.attributes.borrow_mut();
        if attributes.iter().any(|a| a.name == name) {
            return Err(cpl::report(GdalError::AlreadyExists {
                kind: "attribute",
                name: name.to_string(),
            }));
        }
        let attribute = Attribute {
            name: name.to_string(),
            value,
        };
        attributes.push(attribute.clone());
        Ok(attribute)
    }

    pub(crate) fn get(&self, name: &str) -> Result<Attribute> {
        self.attributes
            .borrow()
            .iter()
            .find(|a| a.name == name)
            .cloned()
            .ok_or_else(|| {
                cpl::report(GdalError::NotFound {
                    kind: "attribute",
                    name: name.to_string(),
                })
            })
    }

    pub(crate) fn list(&self) -> Vec<Attribute> {
        self.attributes.borrow().clone()
    }
}
