//! Balance aggregation: replay the movement ledger into per-location stock.
//!
//! The sheet is always rebuilt from the full movement set. Summation is
//! commutative, so replay order (and timestamp skew between writers) does not
//! affect the result.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use stockroom_core::{LocationId, ProductId};

use crate::location::Location;
use crate::movement::Movement;
use crate::product::Product;

/// Optional restriction of the report to one product and/or one location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceFilter {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub location_id: Option<LocationId>,
}

impl BalanceFilter {
    fn matches(&self, product_id: ProductId, location_id: LocationId) -> bool {
        self.product_id.is_none_or(|p| p == product_id)
            && self.location_id.is_none_or(|l| l == location_id)
    }
}

/// One non-zero line of the balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRow {
    pub product_id: ProductId,
    pub sku: String,
    pub product_name: String,
    pub location_id: LocationId,
    pub location_code: String,
    pub location_name: String,
    pub quantity: i128,
}

/// Net quantity per (product, location), densely seeded for the whole catalog.
///
/// Cells accumulate in `i128`: summing any realistic number of `i64` legs
/// cannot overflow it.
#[derive(Debug, Clone)]
pub struct BalanceSheet {
    products: Vec<Product>,
    locations: Vec<Location>,
    cells: HashMap<(ProductId, LocationId), i128>,
    orphaned: usize,
}

impl BalanceSheet {
    /// Replay `movements` over the given catalog.
    ///
    /// Every product × location pair starts at zero. A movement leg that names
    /// a product or location outside the catalog is skipped and counted in
    /// [`orphaned`](Self::orphaned).
    pub fn compute<'a>(
        products: &[Product],
        locations: &[Location],
        movements: impl IntoIterator<Item = &'a Movement>,
    ) -> Self {
        let mut products = products.to_vec();
        products.sort_by(|a, b| (&a.name, &a.sku).cmp(&(&b.name, &b.sku)));
        let mut locations = locations.to_vec();
        locations.sort_by(|a, b| (&a.name, &a.code).cmp(&(&b.name, &b.code)));

        let mut cells = HashMap::with_capacity(products.len() * locations.len());
        for p in &products {
            for l in &locations {
                cells.insert((p.id, l.id), 0i128);
            }
        }

        let mut orphaned = 0;
        for mv in movements {
            for (location_id, delta) in mv.contributions() {
                match cells.get_mut(&(mv.product_id, location_id)) {
                    Some(cell) => *cell += delta,
                    None => orphaned += 1,
                }
            }
        }

        Self {
            products,
            locations,
            cells,
            orphaned,
        }
    }

    /// Net quantity for a pair; `None` if either side is not in the catalog.
    pub fn net(&self, product_id: ProductId, location_id: LocationId) -> Option<i128> {
        self.cells.get(&(product_id, location_id)).copied()
    }

    /// Net quantity of a product summed over every location.
    pub fn product_total(&self, product_id: ProductId) -> i128 {
        self.locations
            .iter()
            .filter_map(|l| self.net(product_id, l.id))
            .sum()
    }

    /// Movement legs skipped because they referenced unknown records.
    pub fn orphaned(&self) -> usize {
        self.orphaned
    }

    /// Non-zero balances, ordered by product (name, sku) then location (name, code).
    pub fn rows(&self) -> Vec<BalanceRow> {
        self.rows_matching(&BalanceFilter::default())
    }

    pub fn rows_matching(&self, filter: &BalanceFilter) -> Vec<BalanceRow> {
        let mut rows = Vec::new();
        for p in &self.products {
            for l in &self.locations {
                if !filter.matches(p.id, l.id) {
                    continue;
                }
                let quantity = self.net(p.id, l.id).unwrap_or(0);
                if quantity == 0 {
                    continue;
                }
                rows.push(BalanceRow {
                    product_id: p.id,
                    sku: p.sku.clone(),
                    product_name: p.name.clone(),
                    location_id: l.id,
                    location_code: l.code.clone(),
                    location_name: l.name.clone(),
                    quantity,
                });
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use stockroom_core::MovementId;

    fn product(sku: &str, name: &str) -> Product {
        Product {
            id: ProductId::new(),
            sku: sku.to_string(),
            name: name.to_string(),
            description: None,
        }
    }

    fn location(code: &str, name: &str) -> Location {
        Location {
            id: LocationId::new(),
            code: code.to_string(),
            name: name.to_string(),
            address: None,
        }
    }

    // Built directly so tests can also exercise inputs the validator would refuse.
    fn mv(product: &Product, from: Option<&Location>, to: Option<&Location>, qty: i64) -> Movement {
        Movement {
            id: MovementId::new(),
            recorded_at: Utc::now(),
            product_id: product.id,
            from_location_id: from.map(|l| l.id),
            to_location_id: to.map(|l| l.id),
            qty,
        }
    }

    #[test]
    fn receive_transfer_ship_scenario() {
        let a = product("A", "A");
        let w1 = location("W1", "W1");
        let w2 = location("W2", "W2");
        let movements = vec![
            mv(&a, None, Some(&w1), 50),
            mv(&a, Some(&w1), Some(&w2), 10),
            mv(&a, Some(&w2), None, 3),
        ];

        let sheet = BalanceSheet::compute(&[a.clone()], &[w1.clone(), w2.clone()], &movements);
        let rows = sheet.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].location_code.as_str(), rows[0].quantity), ("W1", 40));
        assert_eq!((rows[1].location_code.as_str(), rows[1].quantity), ("W2", 7));
        assert_eq!(sheet.product_total(a.id), 47);
    }

    #[test]
    fn zero_balances_are_hidden_but_distinguishable() {
        let a = product("A", "A");
        let w1 = location("W1", "W1");
        let w2 = location("W2", "W2");
        let movements = vec![mv(&a, None, Some(&w1), 5), mv(&a, Some(&w1), None, 5)];

        let sheet = BalanceSheet::compute(&[a.clone()], &[w1.clone(), w2.clone()], &movements);
        assert!(sheet.rows().is_empty());
        assert_eq!(sheet.net(a.id, w1.id), Some(0));
        assert_eq!(sheet.net(a.id, w2.id), Some(0));
        assert_eq!(sheet.net(a.id, LocationId::new()), None);
    }

    #[test]
    fn rows_sort_by_name_then_natural_key() {
        let b = product("SKU-B", "Bolt");
        let a2 = product("SKU-2", "Anchor");
        let a1 = product("SKU-1", "Anchor");
        let store = location("STORE", "Retail");
        let wh = location("WH", "Depot");

        let movements = vec![
            mv(&b, None, Some(&store), 1),
            mv(&a2, None, Some(&wh), 2),
            mv(&a1, None, Some(&store), 3),
            mv(&a1, None, Some(&wh), 4),
        ];
        let sheet = BalanceSheet::compute(&[b, a2, a1], &[store, wh], &movements);
        let order: Vec<_> = sheet
            .rows()
            .iter()
            .map(|r| format!("{}@{}", r.sku, r.location_code))
            .collect();
        assert_eq!(order, vec!["SKU-1@WH", "SKU-1@STORE", "SKU-2@WH", "SKU-B@STORE"]);
    }

    #[test]
    fn filter_restricts_rows() {
        let a = product("A", "A");
        let b = product("B", "B");
        let w1 = location("W1", "W1");
        let w2 = location("W2", "W2");
        let movements = vec![
            mv(&a, None, Some(&w1), 1),
            mv(&a, None, Some(&w2), 2),
            mv(&b, None, Some(&w1), 3),
        ];
        let sheet = BalanceSheet::compute(&[a.clone(), b], &[w1.clone(), w2], &movements);

        let only_a = sheet.rows_matching(&BalanceFilter {
            product_id: Some(a.id),
            location_id: None,
        });
        assert_eq!(only_a.len(), 2);

        let only_w1 = sheet.rows_matching(&BalanceFilter {
            product_id: None,
            location_id: Some(w1.id),
        });
        assert_eq!(only_w1.iter().map(|r| r.quantity).sum::<i128>(), 4);
    }

    #[test]
    fn legs_outside_the_catalog_are_counted_not_applied() {
        let a = product("A", "A");
        let w1 = location("W1", "W1");
        let gone = location("GONE", "Gone");
        let movements = vec![mv(&a, Some(&gone), Some(&w1), 6), mv(&product("X", "X"), None, Some(&w1), 9)];

        let sheet = BalanceSheet::compute(&[a.clone()], &[w1.clone()], &movements);
        assert_eq!(sheet.net(a.id, w1.id), Some(6));
        assert_eq!(sheet.orphaned(), 2);
    }

    #[test]
    fn unplaced_movement_is_inert() {
        let a = product("A", "A");
        let w1 = location("W1", "W1");
        let sheet = BalanceSheet::compute(&[a.clone()], &[w1.clone()], &[mv(&a, None, None, 8)]);
        assert_eq!(sheet.net(a.id, w1.id), Some(0));
        assert_eq!(sheet.orphaned(), 0);
    }

    #[test]
    fn extreme_quantities_do_not_overflow() {
        let a = product("A", "A");
        let w1 = location("W1", "W1");
        let w2 = location("W2", "W2");
        let movements = vec![
            mv(&a, None, Some(&w1), i64::MAX),
            mv(&a, None, Some(&w1), i64::MAX),
            mv(&a, None, Some(&w2), i64::MAX),
            mv(&a, Some(&w2), None, i64::MIN),
        ];

        let sheet = BalanceSheet::compute(&[a.clone()], &[w1.clone(), w2.clone()], &movements);
        let max = i128::from(i64::MAX);
        assert_eq!(sheet.net(a.id, w1.id), Some(2 * max));
        assert_eq!(sheet.net(a.id, w2.id), Some(max - i128::from(i64::MIN)));
        assert_eq!(sheet.product_total(a.id), 3 * max - i128::from(i64::MIN));
        assert_eq!(sheet.rows()[0].quantity, 2 * max);
    }

    /// (product index, from index, to index, qty); index `None` means external.
    fn movement_specs() -> impl Strategy<Value = Vec<(usize, Option<usize>, Option<usize>, i64)>> {
        prop::collection::vec(
            (0usize..3, prop::option::of(0usize..4), prop::option::of(0usize..4), 1i64..500),
            0..40,
        )
    }

    struct Fixture {
        products: Vec<Product>,
        locations: Vec<Location>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                products: (0..3).map(|i| product(&format!("P{i}"), &format!("Product {i}"))).collect(),
                locations: (0..4).map(|i| location(&format!("L{i}"), &format!("Location {i}"))).collect(),
            }
        }

        fn build(&self, specs: &[(usize, Option<usize>, Option<usize>, i64)]) -> Vec<Movement> {
            specs
                .iter()
                .map(|(p, from, to, qty)| {
                    mv(
                        &self.products[*p],
                        from.map(|i| &self.locations[i]),
                        to.map(|i| &self.locations[i]),
                        *qty,
                    )
                })
                .collect()
        }

        fn sheet(&self, movements: &[Movement]) -> BalanceSheet {
            BalanceSheet::compute(&self.products, &self.locations, movements)
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: each reported net equals inflows minus outflows for that pair.
        #[test]
        fn net_equals_inflows_minus_outflows(specs in movement_specs()) {
            let fx = Fixture::new();
            let movements = fx.build(&specs);
            let sheet = fx.sheet(&movements);

            for p in &fx.products {
                for l in &fx.locations {
                    let inflow: i128 = movements
                        .iter()
                        .filter(|m| m.product_id == p.id && m.to_location_id == Some(l.id))
                        .map(|m| i128::from(m.qty))
                        .sum();
                    let outflow: i128 = movements
                        .iter()
                        .filter(|m| m.product_id == p.id && m.from_location_id == Some(l.id))
                        .map(|m| i128::from(m.qty))
                        .sum();
                    prop_assert_eq!(sheet.net(p.id, l.id), Some(inflow - outflow));
                }
            }
        }

        /// Property: replay order does not matter.
        #[test]
        fn permutation_does_not_change_rows(specs in movement_specs(), seed in any::<u64>()) {
            let fx = Fixture::new();
            let movements = fx.build(&specs);

            let mut shuffled = movements.clone();
            // Deterministic pseudo-shuffle driven by the generated seed.
            let mut state = seed | 1;
            for i in (1..shuffled.len()).rev() {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                let j = (state % (i as u64 + 1)) as usize;
                shuffled.swap(i, j);
            }
            shuffled.reverse();

            prop_assert_eq!(fx.sheet(&movements).rows(), fx.sheet(&shuffled).rows());
        }

        /// Property: deleting a movement equals never having recorded it.
        #[test]
        fn removal_leaves_no_residue(specs in movement_specs(), pick in any::<prop::sample::Index>()) {
            prop_assume!(!specs.is_empty());
            let fx = Fixture::new();
            let mut movements = fx.build(&specs);
            let k = pick.index(movements.len());
            movements.remove(k);
            let after_delete = fx.sheet(&movements);

            let mut remaining_specs = specs.clone();
            remaining_specs.remove(k);
            let never_inserted = fx.build(&remaining_specs);
            prop_assert_eq!(after_delete.rows(), fx.sheet(&never_inserted).rows());
        }

        /// Property: transfers only move stock; product totals track external flows.
        #[test]
        fn transfers_conserve_product_totals(specs in movement_specs()) {
            let fx = Fixture::new();
            let movements = fx.build(&specs);
            let sheet = fx.sheet(&movements);

            for p in &fx.products {
                let external: i128 = movements
                    .iter()
                    .filter(|m| m.product_id == p.id)
                    .map(|m| match (m.from_location_id, m.to_location_id) {
                        (None, Some(_)) => i128::from(m.qty),
                        (Some(_), None) => -i128::from(m.qty),
                        _ => 0,
                    })
                    .sum();
                prop_assert_eq!(sheet.product_total(p.id), external);
            }
        }
    }
}
