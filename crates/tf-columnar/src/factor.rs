use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tf_runtime::{BoundaryError, ConversionContext, ErrorKind, FromHost, ToHost};
use tf_types::{HostValue, HostValueError, LEVELS_ATTR};
use thiserror::Error;

pub const FACTOR_CLASS: &str = "factor";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CategoricalError {
    #[error("duplicate factor level `{0}`")]
    DuplicateLevel(String),
    #[error("label `{0}` has no matching level")]
    UnknownLabel(String),
    #[error("level code {code} out of range for {levels} levels")]
    CodeOutOfRange { code: i64, levels: usize },
    #[error("observation {index} out of range for factor of length {len}")]
    ObservationOutOfRange { index: usize, len: usize },
    #[error("level {index} out of range for {levels} levels")]
    LevelOutOfRange { index: usize, levels: usize },
    #[error("host factor is malformed: {0}")]
    MalformedHost(String),
    #[error(transparent)]
    Host(#[from] HostValueError),
}

impl BoundaryError for CategoricalError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateLevel(_) | Self::UnknownLabel(_) => ErrorKind::InvalidLabel,
            Self::CodeOutOfRange { .. }
            | Self::ObservationOutOfRange { .. }
            | Self::LevelOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            Self::MalformedHost(_) | Self::Host(_) => ErrorKind::InvalidFormat,
        }
    }
}

/// A factor: unique level names plus one zero-based level index per
/// observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EncodedCategorical")]
pub struct Categorical {
    levels: Vec<String>,
    codes: Vec<usize>,
}

#[derive(Deserialize)]
struct EncodedCategorical {
    levels: Vec<String>,
    codes: Vec<usize>,
}

impl TryFrom<EncodedCategorical> for Categorical {
    type Error = CategoricalError;

    fn try_from(raw: EncodedCategorical) -> Result<Self, Self::Error> {
        Self::from_encoded(raw.levels, raw.codes)
    }
}

impl Categorical {
    /// Levels are the sorted distinct labels.
    pub fn from_labels<I, S>(labels: I) -> Result<Self, CategoricalError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let mut levels = labels.clone();
        levels.sort();
        levels.dedup();

        let codes = labels
            .iter()
            .map(|label| {
                levels
                    .binary_search(label)
                    .map_err(|_| CategoricalError::UnknownLabel(label.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { levels, codes })
    }

    /// Keeps `levels` in the given order; `codes` are zero-based.
    pub fn from_encoded(levels: Vec<String>, codes: Vec<usize>) -> Result<Self, CategoricalError> {
        let mut seen = HashSet::with_capacity(levels.len());
        for level in &levels {
            if !seen.insert(level.as_str()) {
                return Err(CategoricalError::DuplicateLevel(level.clone()));
            }
        }
        if let Some(&code) = codes.iter().find(|&&code| code >= levels.len()) {
            return Err(CategoricalError::CodeOutOfRange {
                code: code as i64,
                levels: levels.len(),
            });
        }
        Ok(Self { levels, codes })
    }

    #[must_use]
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    #[must_use]
    pub fn codes(&self) -> &[usize] {
        &self.codes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    #[must_use]
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn observed_level_index(&self, index: usize) -> Result<usize, CategoricalError> {
        self.codes
            .get(index)
            .copied()
            .ok_or(CategoricalError::ObservationOutOfRange {
                index,
                len: self.codes.len(),
            })
    }

    /// One-based level number, as the host numbers levels.
    pub fn observed_level_number(&self, index: usize) -> Result<usize, CategoricalError> {
        self.observed_level_index(index).map(|code| code + 1)
    }

    pub fn observed_label(&self, index: usize) -> Result<&str, CategoricalError> {
        let code = self.observed_level_index(index)?;
        self.level_name(code)
    }

    pub fn level_name(&self, level: usize) -> Result<&str, CategoricalError> {
        self.levels
            .get(level)
            .map(String::as_str)
            .ok_or(CategoricalError::LevelOutOfRange {
                index: level,
                levels: self.levels.len(),
            })
    }

    /// Labels in observation order.
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.codes.iter().map(|&code| self.levels[code].as_str())
    }
}

impl FromHost for Categorical {
    type Error = CategoricalError;

    fn from_host(value: &HostValue, _ctx: &mut ConversionContext) -> Result<Self, Self::Error> {
        if !value.inherits(FACTOR_CLASS) {
            return Err(CategoricalError::MalformedHost(
                "missing class `factor`".to_owned(),
            ));
        }
        let levels = value
            .attr(LEVELS_ATTR)
            .ok_or_else(|| CategoricalError::MalformedHost("missing `levels`".to_owned()))?
            .as_character()?
            .to_vec();
        let codes = value
            .as_integer()?
            .iter()
            .map(|&code| {
                if code >= 1 && (code as usize) <= levels.len() {
                    Ok(code as usize - 1)
                } else {
                    Err(CategoricalError::MalformedHost(format!(
                        "code {code} outside 1..={}",
                        levels.len()
                    )))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_encoded(levels, codes)
    }
}

impl ToHost for Categorical {
    type Error = CategoricalError;

    fn to_host(&self, _ctx: &mut ConversionContext) -> Result<HostValue, Self::Error> {
        let codes = self
            .codes
            .iter()
            .map(|&code| {
                i32::try_from(code + 1).map_err(|_| CategoricalError::CodeOutOfRange {
                    code: code as i64,
                    levels: self.levels.len(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(HostValue::integer(codes)
            .with_attr(LEVELS_ATTR, HostValue::character(self.levels.iter().map(String::as_str)))
            .with_class([FACTOR_CLASS]))
    }
}
