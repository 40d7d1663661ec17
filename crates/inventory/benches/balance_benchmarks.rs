use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::Utc;
use stockroom_core::{LocationId, MovementId, ProductId};
use stockroom_inventory::{BalanceSheet, Location, Movement, Product};

fn catalog(products: usize, locations: usize) -> (Vec<Product>, Vec<Location>) {
    let products = (0..products)
        .map(|i| Product {
            id: ProductId::new(),
            sku: format!("SKU-{i:04}"),
            name: format!("Product {i:04}"),
            description: None,
        })
        .collect();
    let locations = (0..locations)
        .map(|i| Location {
            id: LocationId::new(),
            code: format!("LOC-{i:03}"),
            name: format!("Location {i:03}"),
            address: None,
        })
        .collect();
    (products, locations)
}

/// Mix of receipts, transfers and shipments spread over the catalog.
fn ledger(products: &[Product], locations: &[Location], count: usize) -> Vec<Movement> {
    (0..count)
        .map(|i| {
            let product = &products[i % products.len()];
            let a = locations[i % locations.len()].id;
            let b = locations[(i + 1) % locations.len()].id;
            let (from, to) = match i % 3 {
                0 => (None, Some(a)),
                1 => (Some(a), Some(b)),
                _ => (Some(b), None),
            };
            Movement {
                id: MovementId::new(),
                recorded_at: Utc::now(),
                product_id: product.id,
                from_location_id: from,
                to_location_id: to,
                qty: (i % 50 + 1) as i64,
            }
        })
        .collect()
}

fn bench_full_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("balance_full_replay");
    let (products, locations) = catalog(50, 10);

    for movement_count in [100usize, 1_000, 10_000].iter() {
        let movements = ledger(&products, &locations, *movement_count);
        group.throughput(Throughput::Elements(*movement_count as u64));
        group.bench_with_input(
            BenchmarkId::new("compute_and_rows", movement_count),
            &movements,
            |b, movements| {
                b.iter(|| {
                    let sheet = BalanceSheet::compute(&products, &locations, movements);
                    black_box(sheet.rows());
                });
            },
        );
    }

    group.finish();
}

fn bench_dense_seeding(c: &mut Criterion) {
    let mut group = c.benchmark_group("balance_dense_seeding");

    for (p, l) in [(10usize, 5usize), (100, 20), (1_000, 50)].iter() {
        let (products, locations) = catalog(*p, *l);
        group.bench_with_input(
            BenchmarkId::new("empty_ledger", format!("{p}x{l}")),
            &(products, locations),
            |b, (products, locations)| {
                b.iter(|| black_box(BalanceSheet::compute(products, locations, std::iter::empty::<&Movement>())));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_full_replay, bench_dense_seeding);
criterion_main!(benches);
