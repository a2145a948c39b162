//! Pet record and write payload.
//!
//! # Responsibility
//! - Define the canonical `Pet` read shape.
//! - Define `PetValues`, the partial record used by insert and update.
//! - Validate payloads before any store access.
//!
//! # Invariants
//! - Validation order is name, gender, weight; the first failure wins.
//! - Update validation only inspects slots present in the payload.

use crate::contract::{is_valid_gender, Gender, COLUMN_GENDER, COLUMN_NAME, COLUMN_WEIGHT};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned pet identifier.
pub type PetId = i64;

/// One stored pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    /// Assigned by the store on insert, immutable afterwards.
    pub id: PetId,
    pub name: String,
    pub breed: Option<String>,
    pub gender: Gender,
    /// Absent or non-negative.
    pub weight: Option<i64>,
}

/// One slot of a partial record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Field<T> {
    /// Not part of the payload; the stored value is left untouched.
    #[default]
    Unset,
    /// Present and explicitly null.
    Null,
    Value(T),
}

impl<T> Field<T> {
    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Unset | Self::Null => None,
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Value(value),
            None => Self::Null,
        }
    }
}

/// Typed partial pet record used as insert/update payload.
///
/// Gender is carried as its raw code so callers can submit any integer and
/// have it rejected by validation rather than by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PetValues {
    pub name: Field<String>,
    pub breed: Field<String>,
    pub gender: Field<i64>,
    pub weight: Field<i64>,
}

impl PetValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Field::Value(name.into());
        self
    }

    pub fn breed(mut self, breed: impl Into<String>) -> Self {
        self.breed = Field::Value(breed.into());
        self
    }

    pub fn gender(mut self, gender: Gender) -> Self {
        self.gender = Field::Value(gender.code());
        self
    }

    /// Sets a raw gender code without checking it.
    pub fn gender_code(mut self, code: i64) -> Self {
        self.gender = Field::Value(code);
        self
    }

    pub fn weight(mut self, weight: i64) -> Self {
        self.weight = Field::Value(weight);
        self
    }

    /// Returns true when no slot is part of the payload.
    pub fn is_empty(&self) -> bool {
        !self.name.is_set()
            && !self.breed.is_set()
            && !self.gender.is_set()
            && !self.weight.is_set()
    }

    /// Number of slots present in the payload.
    pub fn len(&self) -> usize {
        [
            self.name.is_set(),
            self.breed.is_set(),
            self.gender.is_set(),
            self.weight.is_set(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    /// Checks a full-record payload.
    ///
    /// # Errors
    /// - `MissingName` when `name` is unset or null.
    /// - `InvalidGender` when `gender` is unset, null or out of range.
    /// - `NegativeWeight` when `weight` is below zero.
    pub fn validate_for_insert(&self) -> Result<(), PetValidationError> {
        check_name(&self.name)?;
        check_gender(&self.gender)?;
        check_weight(&self.weight)
    }

    /// Checks a partial payload; unset slots are skipped.
    pub fn validate_for_update(&self) -> Result<(), PetValidationError> {
        if self.name.is_set() {
            check_name(&self.name)?;
        }
        if self.gender.is_set() {
            check_gender(&self.gender)?;
        }
        check_weight(&self.weight)
    }
}

fn check_name(name: &Field<String>) -> Result<(), PetValidationError> {
    match name {
        Field::Value(_) => Ok(()),
        Field::Unset | Field::Null => Err(PetValidationError::MissingName),
    }
}

fn check_gender(gender: &Field<i64>) -> Result<(), PetValidationError> {
    match gender {
        Field::Value(code) if is_valid_gender(*code) => Ok(()),
        Field::Value(code) => Err(PetValidationError::InvalidGender(Some(*code))),
        Field::Unset | Field::Null => Err(PetValidationError::InvalidGender(None)),
    }
}

fn check_weight(weight: &Field<i64>) -> Result<(), PetValidationError> {
    match weight {
        Field::Value(value) if *value < 0 => Err(PetValidationError::NegativeWeight(*value)),
        _ => Ok(()),
    }
}

/// Write payload rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PetValidationError {
    MissingName,
    /// Carries the rejected code, or `None` when the slot was unset/null.
    InvalidGender(Option<i64>),
    NegativeWeight(i64),
}

impl PetValidationError {
    /// Column name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingName => COLUMN_NAME,
            Self::InvalidGender(_) => COLUMN_GENDER,
            Self::NegativeWeight(_) => COLUMN_WEIGHT,
        }
    }
}

impl Display for PetValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "pet requires a name"),
            Self::InvalidGender(Some(code)) => write!(f, "pet gender code {code} is not valid"),
            Self::InvalidGender(None) => write!(f, "pet requires a gender"),
            Self::NegativeWeight(value) => {
                write!(f, "pet weight must not be negative, got {value}")
            }
        }
    }
}

impl Error for PetValidationError {}
