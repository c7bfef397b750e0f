//! restage-catalog: design brief and static recommendation catalog.
//!
//! Everything here is plain data and validation -- no I/O, no models.
//! The brief captures the client's wishes, the asset module names the
//! hosted static images, and the recommendation module filters a fixed
//! product list against a brief.

pub mod assets;
pub mod brief;
pub mod recommend;

pub use assets::{Asset, AssetCatalog, DEFAULT_BASE_URL};
pub use brief::{
    BriefError, DesignBrief, Gender, SpaceCondition, SpaceType, Style, DEFAULT_AGE, MAX_AGE,
    MAX_BUDGET, MIN_AGE, MIN_BUDGET,
};
pub use recommend::{recommend, Recommendation, CATALOG};
