use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::catalog::{Catalog, GLOVES_ID};
use crate::domain::wizard::{GlovesSize, Selection};

// ============================================================================
// Budget Engine - pure derivations over (Selection, Catalog)
// ============================================================================
//
// Nothing here is cached: every figure is recomputed from the selection on
// each call, so there is no stored total that could drift from it.
//
// ============================================================================

/// Monthly ceiling for budget-counted supplies: 42.00
pub const DEFAULT_BUDGET_LIMIT: Decimal = Decimal::from_parts(4200, 0, 0, false, 2);

/// Share of the limit above which the budget bar turns to a warning.
const WARNING_THRESHOLD_PERCENT: u32 = 80;

/// Round to whole cents, halves away from zero.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Sum of quantity x price over selected ids the catalog knows.
pub fn total(selection: &Selection, catalog: &Catalog) -> Decimal {
    let sum: Decimal = selection
        .selected()
        .filter_map(|line| {
            catalog
                .price_of(&line.product_id)
                .map(|price| price * Decimal::from(line.quantity))
        })
        .sum();
    round_cents(sum)
}

/// Budget left over; negative once the selection is over the limit.
pub fn remaining(selection: &Selection, catalog: &Catalog, limit: Decimal) -> Decimal {
    round_cents(limit - total(selection, catalog))
}

pub fn is_over_budget(selection: &Selection, catalog: &Catalog, limit: Decimal) -> bool {
    total(selection, catalog) > limit
}

/// Whether one more unit of `product_id` still fits under the limit.
pub fn can_increase(selection: &Selection, catalog: &Catalog, limit: Decimal, product_id: &str) -> bool {
    match catalog.price_of(product_id) {
        Some(price) => round_cents(total(selection, catalog) + price) <= limit,
        None => false,
    }
}

/// One selected product joined with its catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub product_id: String,
    pub name: String,
    pub meta: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    /// Only ever set for gloves
    pub size: Option<GlovesSize>,
    pub line_total: Decimal,
}

/// Selected lines in order of first selection. Ids missing from the catalog
/// cannot be ordered and are left out.
pub fn projection(selection: &Selection, gloves_size: Option<GlovesSize>, catalog: &Catalog) -> Vec<LineItem> {
    selection
        .selected()
        .filter_map(|line| {
            let item = catalog.get(&line.product_id)?;
            Some(LineItem {
                product_id: item.id.clone(),
                name: item.name.clone(),
                meta: item.meta.clone(),
                unit_price: item.price,
                quantity: line.quantity,
                size: if item.id == GLOVES_ID { gloves_size } else { None },
                line_total: round_cents(item.price * Decimal::from(line.quantity)),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BudgetLevel {
    Ok,
    Warning,
    Over,
}

/// Everything a budget bar needs in one read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStatus {
    pub total: Decimal,
    pub limit: Decimal,
    pub remaining: Decimal,
    /// `total / limit`, capped at 1
    pub used_fraction: Decimal,
    pub level: BudgetLevel,
}

pub fn status(selection: &Selection, catalog: &Catalog, limit: Decimal) -> BudgetStatus {
    let total = total(selection, catalog);

    let used_fraction = if limit > Decimal::ZERO {
        (total / limit).min(Decimal::ONE)
    } else {
        Decimal::ONE
    };

    let level = if total > limit {
        BudgetLevel::Over
    } else if used_fraction * Decimal::ONE_HUNDRED > Decimal::from(WARNING_THRESHOLD_PERCENT) {
        BudgetLevel::Warning
    } else {
        BudgetLevel::Ok
    };

    BudgetStatus {
        total,
        limit,
        remaining: round_cents(limit - total),
        used_fraction,
        level,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogItem;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn test_catalog() -> Catalog {
        Catalog::new(vec![
            CatalogItem::new("aprons", "Schutzschürzen", "Einmalgebrauch", dec("12.50")),
            CatalogItem::new(GLOVES_ID, "Einmalhandschuhe", "100 Stk", dec("9.00")),
            CatalogItem::new("handdes", "Händedesinfektionsmittel", "500 ml", dec("9.00")),
            CatalogItem::new("ffp2", "FFP2-Masken", "10 Stk", dec("4.99")),
            CatalogItem::new("odd", "Odd price", "", dec("0.005")),
        ])
        .unwrap()
    }

    #[test]
    fn test_default_limit_is_42() {
        assert_eq!(DEFAULT_BUDGET_LIMIT, dec("42.00"));
    }

    #[test]
    fn test_end_to_end_budget_example() {
        let catalog = test_catalog();
        let selection = Selection::new()
            .with_quantity("aprons", 2)
            .with_quantity(GLOVES_ID, 1);

        assert_eq!(total(&selection, &catalog), dec("34.00"));
        assert_eq!(remaining(&selection, &catalog, DEFAULT_BUDGET_LIMIT), dec("8.00"));
        assert!(!is_over_budget(&selection, &catalog, DEFAULT_BUDGET_LIMIT));

        // one more 9.00 item lands at 43.00
        assert!(!can_increase(&selection, &catalog, DEFAULT_BUDGET_LIMIT, "handdes"));
        let over = selection.with_quantity("handdes", 1);
        assert_eq!(total(&over, &catalog), dec("43.00"));
        assert!(is_over_budget(&over, &catalog, DEFAULT_BUDGET_LIMIT));
        assert_eq!(remaining(&over, &catalog, DEFAULT_BUDGET_LIMIT), dec("-1.00"));
    }

    #[test]
    fn test_unknown_ids_and_zero_quantities_contribute_nothing() {
        let catalog = test_catalog();
        let selection = Selection::new()
            .with_quantity("unknown", 7)
            .with_quantity("ffp2", 0);

        assert_eq!(total(&selection, &catalog), Decimal::ZERO);
        assert!(!can_increase(&selection, &catalog, DEFAULT_BUDGET_LIMIT, "unknown"));
    }

    #[test]
    fn test_repeated_additions_do_not_drift() {
        let catalog = test_catalog();
        let selection = Selection::new().with_quantity("ffp2", 8);

        // 8 x 4.99 = 39.92 exactly
        assert_eq!(total(&selection, &catalog), dec("39.92"));
        assert!(can_increase(&Selection::new().with_quantity("ffp2", 7), &catalog, DEFAULT_BUDGET_LIMIT, "ffp2"));
        assert!(!can_increase(&selection, &catalog, DEFAULT_BUDGET_LIMIT, "ffp2"));
    }

    #[test]
    fn test_total_rounds_half_up_at_the_cent() {
        let catalog = test_catalog();
        // 0.005 rounds up to 0.01
        assert_eq!(total(&Selection::new().with_quantity("odd", 1), &catalog), dec("0.01"));
        assert_eq!(total(&Selection::new().with_quantity("odd", 3), &catalog), dec("0.02"));
    }

    #[test]
    fn test_exactly_at_limit_is_not_over() {
        let catalog = Catalog::new(vec![CatalogItem::new("x", "X", "", dec("21.00"))]).unwrap();
        let selection = Selection::new().with_quantity("x", 2);

        assert!(!is_over_budget(&selection, &catalog, DEFAULT_BUDGET_LIMIT));
        assert_eq!(remaining(&selection, &catalog, DEFAULT_BUDGET_LIMIT), Decimal::ZERO);
    }

    #[test]
    fn test_projection_attaches_size_to_gloves_only() {
        let catalog = test_catalog();
        let selection = Selection::new()
            .with_quantity(GLOVES_ID, 1)
            .with_quantity("aprons", 2)
            .with_quantity("ffp2", 0)
            .with_quantity("unknown", 1);

        let lines = projection(&selection, Some(GlovesSize::M), &catalog);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].product_id, GLOVES_ID);
        assert_eq!(lines[0].size, Some(GlovesSize::M));
        assert_eq!(lines[1].product_id, "aprons");
        assert_eq!(lines[1].size, None);
        assert_eq!(lines[1].line_total, dec("25.00"));
        assert_eq!(lines[1].name, "Schutzschürzen");
    }

    #[test]
    fn test_status_levels() {
        let catalog = test_catalog();

        let ok = status(&Selection::new().with_quantity("aprons", 1), &catalog, DEFAULT_BUDGET_LIMIT);
        assert_eq!(ok.level, BudgetLevel::Ok);

        let warning = status(&Selection::new().with_quantity("ffp2", 8), &catalog, DEFAULT_BUDGET_LIMIT);
        assert_eq!(warning.level, BudgetLevel::Warning);

        let over = status(&Selection::new().with_quantity("aprons", 4), &catalog, DEFAULT_BUDGET_LIMIT);
        assert_eq!(over.level, BudgetLevel::Over);
        assert_eq!(over.used_fraction, Decimal::ONE);
        assert_eq!(over.remaining, dec("-8.00"));
    }
}
