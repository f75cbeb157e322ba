#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Host sentinel for a missing integer.
pub const NA_INTEGER: i32 = i32::MIN;

pub const CLASS_ATTR: &str = "class";
pub const NAMES_ATTR: &str = "names";
pub const ROW_NAMES_ATTR: &str = "row.names";
pub const LEVELS_ATTR: &str = "levels";
pub const DIM_ATTR: &str = "dim";
pub const INDEX_ATTR: &str = "index";
pub const FREQUENCY_ATTR: &str = "frequency";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostType {
    Null,
    Logical,
    Integer,
    Real,
    Character,
    List,
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "NULL",
            Self::Logical => "logical",
            Self::Integer => "integer",
            Self::Real => "numeric",
            Self::Character => "character",
            Self::List => "list",
        };
        f.write_str(name)
    }
}

/// Physical payload of a host value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum HostVector {
    Null,
    Logical(Vec<bool>),
    Integer(Vec<i32>),
    Real(Vec<f64>),
    Character(Vec<String>),
    List(Vec<HostValue>),
}

impl HostVector {
    #[must_use]
    pub fn host_type(&self) -> HostType {
        match self {
            Self::Null => HostType::Null,
            Self::Logical(_) => HostType::Logical,
            Self::Integer(_) => HostType::Integer,
            Self::Real(_) => HostType::Real,
            Self::Character(_) => HostType::Character,
            Self::List(_) => HostType::List,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Null => 0,
            Self::Logical(v) => v.len(),
            Self::Integer(v) => v.len(),
            Self::Real(v) => v.len(),
            Self::Character(v) => v.len(),
            Self::List(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A tagged host value: a payload plus its attribute map.
///
/// Attributes are keyed by name in a `BTreeMap`, so two values compare equal
/// regardless of the order in which their attributes were attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostValue {
    payload: HostVector,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, HostValue>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostValueError {
    #[error("expected host {expected} vector but found {found}")]
    UnexpectedType { expected: HostType, found: HostType },
    #[error("expected a length-1 host vector but found length {0}")]
    NotScalar(usize),
    #[error("missing required attribute `{0}`")]
    MissingAttribute(String),
    #[error("attribute `{name}` is malformed: {detail}")]
    MalformedAttribute { name: String, detail: String },
}

impl HostValue {
    #[must_use]
    pub fn new(payload: HostVector) -> Self {
        Self {
            payload,
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn null() -> Self {
        Self::new(HostVector::Null)
    }

    #[must_use]
    pub fn logical(values: Vec<bool>) -> Self {
        Self::new(HostVector::Logical(values))
    }

    #[must_use]
    pub fn integer(values: Vec<i32>) -> Self {
        Self::new(HostVector::Integer(values))
    }

    #[must_use]
    pub fn real(values: Vec<f64>) -> Self {
        Self::new(HostVector::Real(values))
    }

    #[must_use]
    pub fn character<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(HostVector::Character(
            values.into_iter().map(Into::into).collect(),
        ))
    }

    #[must_use]
    pub fn list(values: Vec<HostValue>) -> Self {
        Self::new(HostVector::List(values))
    }

    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: HostValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Attach a `class` attribute.
    #[must_use]
    pub fn with_class<I, S>(self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_attr(CLASS_ATTR, Self::character(classes))
    }

    /// Attach a `dim` attribute for a `nrow x ncol` matrix payload.
    #[must_use]
    pub fn with_dim(self, nrow: usize, ncol: usize) -> Self {
        let dims = [nrow, ncol]
            .iter()
            .map(|&d| i32::try_from(d).unwrap_or(i32::MAX))
            .collect();
        self.with_attr(DIM_ATTR, Self::integer(dims))
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: HostValue) {
        self.attributes.insert(name.into(), value);
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<HostValue> {
        self.attributes.remove(name)
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&HostValue> {
        self.attributes.get(name)
    }

    pub fn required_attr(&self, name: &str) -> Result<&HostValue, HostValueError> {
        self.attr(name)
            .ok_or_else(|| HostValueError::MissingAttribute(name.to_owned()))
    }

    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, HostValue> {
        &self.attributes
    }

    #[must_use]
    pub fn payload(&self) -> &HostVector {
        &self.payload
    }

    #[must_use]
    pub fn into_payload(self) -> HostVector {
        self.payload
    }

    #[must_use]
    pub fn host_type(&self) -> HostType {
        self.payload.host_type()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// The `class` attribute, when present and character-typed.
    #[must_use]
    pub fn class(&self) -> Option<&[String]> {
        match self.attr(CLASS_ATTR).map(HostValue::payload) {
            Some(HostVector::Character(classes)) => Some(classes.as_slice()),
            _ => None,
        }
    }

    #[must_use]
    pub fn primary_class(&self) -> Option<&str> {
        self.class()
            .and_then(|classes| classes.first())
            .map(String::as_str)
    }

    #[must_use]
    pub fn inherits(&self, class: &str) -> bool {
        self.class()
            .is_some_and(|classes| classes.iter().any(|c| c == class))
    }

    pub fn as_logical(&self) -> Result<&[bool], HostValueError> {
        match &self.payload {
            HostVector::Logical(v) => Ok(v),
            other => Err(self.unexpected(HostType::Logical, other)),
        }
    }

    pub fn as_integer(&self) -> Result<&[i32], HostValueError> {
        match &self.payload {
            HostVector::Integer(v) => Ok(v),
            other => Err(self.unexpected(HostType::Integer, other)),
        }
    }

    pub fn as_real(&self) -> Result<&[f64], HostValueError> {
        match &self.payload {
            HostVector::Real(v) => Ok(v),
            other => Err(self.unexpected(HostType::Real, other)),
        }
    }

    pub fn as_character(&self) -> Result<&[String], HostValueError> {
        match &self.payload {
            HostVector::Character(v) => Ok(v),
            other => Err(self.unexpected(HostType::Character, other)),
        }
    }

    pub fn as_list(&self) -> Result<&[HostValue], HostValueError> {
        match &self.payload {
            HostVector::List(v) => Ok(v),
            other => Err(self.unexpected(HostType::List, other)),
        }
    }

    /// Read an integer or real payload as doubles; `NA_INTEGER` becomes NaN.
    pub fn to_f64_vec(&self) -> Result<Vec<f64>, HostValueError> {
        match &self.payload {
            HostVector::Real(v) => Ok(v.clone()),
            HostVector::Integer(v) => Ok(v
                .iter()
                .map(|&x| if x == NA_INTEGER { f64::NAN } else { f64::from(x) })
                .collect()),
            other => Err(self.unexpected(HostType::Real, other)),
        }
    }

    /// Read a length-1 integer or real payload as a double.
    pub fn scalar_f64(&self) -> Result<f64, HostValueError> {
        let values = self.to_f64_vec()?;
        match values.as_slice() {
            [value] => Ok(*value),
            _ => Err(HostValueError::NotScalar(values.len())),
        }
    }

    /// Matrix dimensions from the `dim` attribute, `None` for plain vectors.
    pub fn dim(&self) -> Result<Option<(usize, usize)>, HostValueError> {
        let Some(dim) = self.attr(DIM_ATTR) else {
            return Ok(None);
        };
        let malformed = |detail: &str| HostValueError::MalformedAttribute {
            name: DIM_ATTR.to_owned(),
            detail: detail.to_owned(),
        };
        let extent = |value: f64| {
            let whole = value.is_finite() && value >= 0.0 && value.fract() == 0.0;
            (whole && value < usize::MAX as f64).then_some(value as usize)
        };
        let dims = dim.to_f64_vec().map_err(|_| malformed("not numeric"))?;
        let [nrow, ncol] = dims.as_slice() else {
            return Err(malformed("expected two extents"));
        };
        let (Some(nrow), Some(ncol)) = (extent(*nrow), extent(*ncol)) else {
            return Err(malformed("extents must be non-negative whole numbers"));
        };
        if nrow.checked_mul(ncol) != Some(self.len()) {
            return Err(malformed("dimensions do not match payload length"));
        }
        Ok(Some((nrow, ncol)))
    }

    fn unexpected(&self, expected: HostType, found: &HostVector) -> HostValueError {
        HostValueError::UnexpectedType {
            expected,
            found: found.host_type(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{HostType, HostValue, HostValueError, NA_INTEGER};

    #[test]
    fn class_lookup_reads_first_and_any_entry() {
        let value = HostValue::real(vec![1.0]).with_class(["zooreg", "zoo"]);
        assert_eq!(value.primary_class(), Some("zooreg"));
        assert!(value.inherits("zoo"));
        assert!(!value.inherits("data.frame"));
    }

    #[test]
    fn attribute_order_does_not_affect_equality() {
        let left = HostValue::integer(vec![1])
            .with_attr("levels", HostValue::character(["a"]))
            .with_class(["factor"]);
        let right = HostValue::integer(vec![1])
            .with_class(["factor"])
            .with_attr("levels", HostValue::character(["a"]));
        assert_eq!(left, right);
    }

    #[test]
    fn integer_na_reads_as_nan() {
        let value = HostValue::integer(vec![3, NA_INTEGER]);
        let out = value.to_f64_vec().expect("numeric");
        assert_eq!(out[0], 3.0);
        assert!(out[1].is_nan());
    }

    #[test]
    fn typed_access_reports_actual_type() {
        let err = HostValue::character(["x"])
            .as_real()
            .expect_err("character is not real");
        assert_eq!(
            err,
            HostValueError::UnexpectedType {
                expected: HostType::Real,
                found: HostType::Character,
            }
        );
        assert_eq!(err.to_string(), "expected host numeric vector but found character");
    }

    #[test]
    fn dim_must_match_payload_length() {
        let ok = HostValue::real(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).with_dim(3, 2);
        assert_eq!(ok.dim().expect("dim"), Some((3, 2)));

        let bad = HostValue::real(vec![1.0, 2.0]).with_dim(3, 2);
        assert!(matches!(
            bad.dim(),
            Err(HostValueError::MalformedAttribute { .. })
        ));
    }

    #[test]
    fn dim_rejects_huge_and_fractional_extents() {
        let huge = HostValue::real(vec![1.0]).with_attr("dim", HostValue::real(vec![1e19, 4.0]));
        assert!(matches!(
            huge.dim(),
            Err(HostValueError::MalformedAttribute { .. })
        ));

        let fractional = HostValue::real(vec![1.0; 5])
            .with_attr("dim", HostValue::real(vec![2.5, 2.0]));
        assert!(matches!(
            fractional.dim(),
            Err(HostValueError::MalformedAttribute { .. })
        ));

        let infinite = HostValue::real(vec![])
            .with_attr("dim", HostValue::real(vec![f64::INFINITY, 0.0]));
        assert!(infinite.dim().is_err());
    }

    #[test]
    fn host_values_serialize_with_tagged_payloads() {
        let value = HostValue::integer(vec![1, 2]).with_class(["factor"]);
        let json = serde_json::to_string(&value).expect("serialize");
        assert!(json.contains(r#""type":"integer""#));
        let back: HostValue = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, value);
    }
}
