//! Static furniture recommendations.
//!
//! The catalog is a fixed product list; selection filters it by the
//! brief's space type and budget. No model is involved.

use serde::Serialize;

use crate::assets::Asset;
use crate::brief::{DesignBrief, SpaceType};

/// A recommendable furniture piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    /// Display name.
    pub name: &'static str,
    /// Product shot asset.
    pub asset: Asset,
    /// Price in euros.
    pub price: u32,
    /// Room kinds this piece suits.
    pub spaces: &'static [SpaceType],
}

/// Every product the catalog can recommend, in presentation order.
pub const CATALOG: [Recommendation; 4] = [
    Recommendation {
        name: "Accent chair",
        asset: Asset::Chair,
        price: 320,
        spaces: &[SpaceType::LivingRoom, SpaceType::Bedroom],
    },
    Recommendation {
        name: "Three-seat sofa",
        asset: Asset::Sofa,
        price: 1150,
        spaces: &[SpaceType::LivingRoom],
    },
    Recommendation {
        name: "Coffee table",
        asset: Asset::CoffeeTable,
        price: 240,
        spaces: &[SpaceType::LivingRoom],
    },
    Recommendation {
        name: "Framed painting",
        asset: Asset::Painting,
        price: 95,
        spaces: &[SpaceType::LivingRoom, SpaceType::Bedroom],
    },
];

/// Select the catalog entries matching a brief.
///
/// A piece is recommended when it suits the brief's space type and its
/// price fits the budget. Order follows the catalog, so identical
/// briefs always yield identical lists.
#[must_use]
pub fn recommend(brief: &DesignBrief) -> Vec<&'static Recommendation> {
    CATALOG
        .iter()
        .filter(|r| r.spaces.contains(&brief.space_type()) && r.price <= brief.budget())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::brief::{Gender, SpaceCondition};

    fn brief(space_type: SpaceType, budget: u32) -> DesignBrief {
        DesignBrief::try_new(
            35,
            Gender::Female,
            space_type,
            SpaceCondition::Furnished,
            budget,
            "",
            None,
        )
        .unwrap()
    }

    #[test]
    fn living_room_with_ample_budget_gets_everything() {
        let picks = recommend(&brief(SpaceType::LivingRoom, 5000));
        assert_eq!(picks.len(), CATALOG.len());
    }

    #[test]
    fn bedroom_excludes_living_room_only_pieces() {
        let picks = recommend(&brief(SpaceType::Bedroom, 5000));
        let names: Vec<&str> = picks.iter().map(|r| r.name).collect();
        assert_eq!(names, ["Accent chair", "Framed painting"]);
    }

    #[test]
    fn budget_filters_expensive_pieces() {
        let picks = recommend(&brief(SpaceType::LivingRoom, 300));
        let names: Vec<&str> = picks.iter().map(|r| r.name).collect();
        assert_eq!(names, ["Coffee table", "Framed painting"]);
    }

    #[test]
    fn minimum_budget_still_affords_the_painting() {
        // The cheapest piece (95 EUR) fits even the smallest valid
        // budget, so no living-room brief ever comes back empty-handed.
        let picks = recommend(&brief(SpaceType::LivingRoom, crate::brief::MIN_BUDGET));
        let names: Vec<&str> = picks.iter().map(|r| r.name).collect();
        assert_eq!(names, ["Framed painting"]);
    }

    #[test]
    fn budget_boundary_is_inclusive() {
        let picks = recommend(&brief(SpaceType::Bedroom, 320));
        let names: Vec<&str> = picks.iter().map(|r| r.name).collect();
        assert_eq!(names, ["Accent chair", "Framed painting"]);
    }
}
