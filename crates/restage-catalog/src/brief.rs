//! The design brief: who the client is and what they want done with
//! the space.
//!
//! A brief is collected before any photo is processed and drives the
//! recommendation selection and the optional style step. Construction
//! is validated; a [`DesignBrief`] value is always in range, including
//! after deserialization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Youngest accepted client age.
pub const MIN_AGE: u8 = 18;

/// Oldest accepted client age.
pub const MAX_AGE: u8 = 80;

/// Default client age when none is given.
pub const DEFAULT_AGE: u8 = 30;

/// Smallest accepted budget, in euros.
pub const MIN_BUDGET: u32 = 100;

/// Largest accepted budget, in euros.
pub const MAX_BUDGET: u32 = 100_000;

/// Client gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    /// Female.
    Female,
    /// Male.
    Male,
    /// Any other or undisclosed gender.
    Other,
}

/// The kind of room being redesigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpaceType {
    /// A living room.
    LivingRoom,
    /// A bedroom.
    Bedroom,
}

impl fmt::Display for SpaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LivingRoom => write!(f, "living room"),
            Self::Bedroom => write!(f, "bedroom"),
        }
    }
}

/// How furnished the room currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpaceCondition {
    /// Bare walls and floor.
    Empty,
    /// Some furniture present.
    Intermediate,
    /// Fully furnished.
    Furnished,
}

/// A decoration style the client can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Style {
    /// Clean lines, current materials.
    Modern,
    /// Sparse, functional, neutral.
    Minimalist,
    /// Traditional forms and warm wood.
    Classic,
    /// Exposed structure, metal and brick.
    Industrial,
    /// Eclectic textiles and plants.
    Bohemian,
    /// Light wood, muted colors.
    Scandinavian,
}

impl Style {
    /// Every style, in presentation order.
    pub const ALL: [Self; 6] = [
        Self::Modern,
        Self::Minimalist,
        Self::Classic,
        Self::Industrial,
        Self::Bohemian,
        Self::Scandinavian,
    ];
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Modern => "modern",
            Self::Minimalist => "minimalist",
            Self::Classic => "classic",
            Self::Industrial => "industrial",
            Self::Bohemian => "bohemian",
            Self::Scandinavian => "scandinavian",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Style {
    type Err = BriefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "modern" => Ok(Self::Modern),
            "minimalist" => Ok(Self::Minimalist),
            "classic" => Ok(Self::Classic),
            "industrial" => Ok(Self::Industrial),
            "bohemian" => Ok(Self::Bohemian),
            "scandinavian" => Ok(Self::Scandinavian),
            _ => Err(BriefError::UnknownStyle(s.to_string())),
        }
    }
}

/// Errors raised while constructing a [`DesignBrief`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BriefError {
    /// Age outside `[MIN_AGE, MAX_AGE]`.
    #[error("age {0} is outside the accepted range {MIN_AGE}-{MAX_AGE}")]
    AgeOutOfRange(u8),

    /// Budget outside `[MIN_BUDGET, MAX_BUDGET]`.
    #[error("budget {0} is outside the accepted range {MIN_BUDGET}-{MAX_BUDGET}")]
    BudgetOutOfRange(u32),

    /// A style name that is not in the catalog.
    #[error("unknown style {0:?}")]
    UnknownStyle(String),
}

/// A validated client design brief.
///
/// Build via [`try_new`](Self::try_new); field accessors guarantee the
/// documented ranges. Deserialization re-validates, so a brief read
/// from JSON is as trustworthy as one built in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DesignBriefProxy")]
pub struct DesignBrief {
    age: u8,
    gender: Gender,
    space_type: SpaceType,
    condition: SpaceCondition,
    budget: u32,
    special_request: String,
    style: Option<Style>,
}

impl DesignBrief {
    /// Create a validated brief.
    ///
    /// # Errors
    ///
    /// Returns [`BriefError::AgeOutOfRange`] or
    /// [`BriefError::BudgetOutOfRange`] when the corresponding field is
    /// out of range. The special request is free text and never
    /// rejected.
    pub fn try_new(
        age: u8,
        gender: Gender,
        space_type: SpaceType,
        condition: SpaceCondition,
        budget: u32,
        special_request: impl Into<String>,
        style: Option<Style>,
    ) -> Result<Self, BriefError> {
        if !(MIN_AGE..=MAX_AGE).contains(&age) {
            return Err(BriefError::AgeOutOfRange(age));
        }
        if !(MIN_BUDGET..=MAX_BUDGET).contains(&budget) {
            return Err(BriefError::BudgetOutOfRange(budget));
        }
        Ok(Self {
            age,
            gender,
            space_type,
            condition,
            budget,
            special_request: special_request.into(),
            style,
        })
    }

    /// Client age in years.
    #[must_use]
    pub const fn age(&self) -> u8 {
        self.age
    }

    /// Client gender.
    #[must_use]
    pub const fn gender(&self) -> Gender {
        self.gender
    }

    /// The kind of room being redesigned.
    #[must_use]
    pub const fn space_type(&self) -> SpaceType {
        self.space_type
    }

    /// How furnished the room currently is.
    #[must_use]
    pub const fn condition(&self) -> SpaceCondition {
        self.condition
    }

    /// Budget in euros.
    #[must_use]
    pub const fn budget(&self) -> u32 {
        self.budget
    }

    /// Free-text wishes from the client.
    #[must_use]
    pub fn special_request(&self) -> &str {
        &self.special_request
    }

    /// The requested decoration style, if any.
    #[must_use]
    pub const fn style(&self) -> Option<Style> {
        self.style
    }
}

/// Unvalidated mirror of [`DesignBrief`] used during deserialization.
#[derive(Deserialize)]
struct DesignBriefProxy {
    age: u8,
    gender: Gender,
    space_type: SpaceType,
    condition: SpaceCondition,
    budget: u32,
    special_request: String,
    style: Option<Style>,
}

impl TryFrom<DesignBriefProxy> for DesignBrief {
    type Error = BriefError;

    fn try_from(proxy: DesignBriefProxy) -> Result<Self, Self::Error> {
        Self::try_new(
            proxy.age,
            proxy.gender,
            proxy.space_type,
            proxy.condition,
            proxy.budget,
            proxy.special_request,
            proxy.style,
        )
    }
}
