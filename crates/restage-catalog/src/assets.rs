//! Static asset naming: the conventional filenames the hosted catalog
//! serves, resolved against a configurable base URL.
//!
//! The filenames are a contract with the asset host; renaming one here
//! breaks every deployed client, so they are centralized in [`Asset`]
//! rather than scattered as string literals.

use serde::{Deserialize, Serialize};

use crate::brief::SpaceCondition;

/// Base URL assets are served from when none is configured.
pub const DEFAULT_BASE_URL: &str =
    "https://raw.githubusercontent.com/slunara/InteriorDesignAI/main/images";

/// A hosted static asset, identified by its conventional filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Asset {
    /// Product logo.
    Logo,
    /// Reference photo of an empty room.
    EmptyRoom,
    /// Reference photo of a partly furnished room.
    IntermediateRoom,
    /// Reference photo of a fully furnished room.
    FurnishedRoom,
    /// Chair product shot.
    Chair,
    /// Sofa product shot.
    Sofa,
    /// Coffee table product shot.
    CoffeeTable,
    /// Painting product shot.
    Painting,
    /// Example redesign output.
    ExampleOutput,
}

impl Asset {
    /// The conventional filename for this asset.
    #[must_use]
    pub const fn filename(self) -> &'static str {
        match self {
            Self::Logo => "logo.jpeg",
            Self::EmptyRoom => "empty.png",
            Self::IntermediateRoom => "intermediate.png",
            Self::FurnishedRoom => "furnished.png",
            Self::Chair => "chair.jpeg",
            Self::Sofa => "sofa.jpeg",
            Self::CoffeeTable => "coffee_table.jpeg",
            Self::Painting => "painting.jpeg",
            Self::ExampleOutput => "output.png",
        }
    }

    /// The reference photo illustrating a room condition.
    #[must_use]
    pub const fn for_condition(condition: SpaceCondition) -> Self {
        match condition {
            SpaceCondition::Empty => Self::EmptyRoom,
            SpaceCondition::Intermediate => Self::IntermediateRoom,
            SpaceCondition::Furnished => Self::FurnishedRoom,
        }
    }
}

/// Resolves [`Asset`]s to URLs on a configured host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCatalog {
    base_url: String,
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl AssetCatalog {
    /// Create a catalog serving from `base_url` (with or without a
    /// trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// The configured base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an asset.
    #[must_use]
    pub fn url(&self, asset: Asset) -> String {
        format!("{}/{}", self.base_url, asset.filename())
    }
}
