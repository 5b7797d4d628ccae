//! Demo catalog and order-history generator.
//!
//! Planning is pure and driven entirely by the supplied generator, ids
//! included, so a seeded run produces the same catalog every time. Writing
//! and clearing go through SeaORM in a single transaction each.

use chrono::{DateTime, Datelike, Utc};
use fake::faker::address::en::{BuildingNumber, CityName, StateAbbr, StreetName, ZipCode};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::distributions::Alphanumeric;
use rand::seq::{index, SliceRandom};
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel};
use serde::Serialize;
use tracing::info;
use uuid::{Builder, Uuid};

use crate::config::CatalogConfig;
use crate::db::with_transaction;
use crate::entities::{category, forecast, order, order_item, product, product_history, supplier};
use crate::errors::ServiceError;
use crate::repositories::inventory_store::INSERT_CHUNK_SIZE;
use crate::services::calendar::{months_before, seasonal_multiplier};

const DEPARTMENTS: &[&str] = &[
    "Automotive", "Baby", "Beauty", "Books", "Clothing", "Computers", "Electronics", "Games",
    "Garden", "Grocery", "Health", "Home", "Industrial", "Jewelry", "Kids", "Movies", "Music",
    "Outdoors", "Shoes", "Sports", "Tools", "Toys",
];

const ADJECTIVES: &[&str] = &[
    "Small", "Ergonomic", "Rustic", "Intelligent", "Gorgeous", "Incredible", "Fantastic",
    "Practical", "Sleek", "Awesome", "Generic", "Handcrafted", "Licensed", "Refined", "Tasty",
];

const MATERIALS: &[&str] = &[
    "Steel", "Wooden", "Concrete", "Plastic", "Cotton", "Granite", "Rubber", "Metal", "Soft",
    "Fresh", "Frozen", "Bronze", "Marble",
];

const PRODUCT_NOUNS: &[&str] = &[
    "Chair", "Car", "Computer", "Keyboard", "Mouse", "Bike", "Ball", "Gloves", "Pants", "Shirt",
    "Table", "Shoes", "Hat", "Towels", "Soap", "Tuna", "Chicken", "Fish", "Cheese", "Bacon",
    "Pizza", "Salad", "Sausages", "Chips",
];

const ORDER_STATUSES: &[&str] = &["pending", "processing", "shipped", "delivered", "cancelled"];
const PAYMENT_STATUSES: &[&str] = &["pending", "paid", "failed", "refunded"];
const SHIPPING_METHODS: &[&str] = &["Standard", "Express", "Next Day", "Pickup"];

/// Rows to insert for a demo catalog, in foreign-key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogPlan {
    pub categories: Vec<category::Model>,
    pub suppliers: Vec<supplier::Model>,
    pub products: Vec<product::Model>,
    pub orders: Vec<order::Model>,
    pub order_items: Vec<order_item::Model>,
}

/// Row counts of a planned or written catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub categories: usize,
    pub suppliers: usize,
    pub products: usize,
    pub orders: usize,
    pub order_items: usize,
}

impl CatalogPlan {
    pub fn summary(&self) -> CatalogSummary {
        CatalogSummary {
            categories: self.categories.len(),
            suppliers: self.suppliers.len(),
            products: self.products.len(),
            orders: self.orders.len(),
            order_items: self.order_items.len(),
        }
    }
}

fn random_id<R: Rng>(rng: &mut R) -> Uuid {
    Builder::from_random_bytes(rng.gen()).into_uuid()
}

fn pick<'a, R: Rng>(rng: &mut R, values: &[&'a str]) -> &'a str {
    values.choose(rng).copied().unwrap_or_default()
}

fn street_address<R: Rng>(rng: &mut R) -> String {
    format!(
        "{} {}, {}, {} {}",
        BuildingNumber().fake_with_rng::<String, _>(rng),
        StreetName().fake_with_rng::<String, _>(rng),
        CityName().fake_with_rng::<String, _>(rng),
        StateAbbr().fake_with_rng::<String, _>(rng),
        ZipCode().fake_with_rng::<String, _>(rng),
    )
}

fn product_name<R: Rng>(rng: &mut R) -> String {
    format!(
        "{} {} {}",
        pick(rng, ADJECTIVES),
        pick(rng, MATERIALS),
        pick(rng, PRODUCT_NOUNS)
    )
}

fn sku<R: Rng>(rng: &mut R) -> String {
    (0..8)
        .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_uppercase())
        .collect()
}

/// Plans categories, suppliers, products and `historical_months + 1` months
/// of orders ending in the month of `now`.
///
/// Each month gets roughly `orders_per_month` orders (80% to 120%), scaled by
/// that month's entry in `seasonal` and floored. Orders land on day 1..=28 and
/// never after `now`. Each order carries 1..=`max_order_items` distinct
/// products with quantities 1..=5.
pub fn plan_catalog<R: Rng>(
    config: &CatalogConfig,
    historical_months: u32,
    seasonal: &[f64],
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<CatalogPlan, ServiceError> {
    let mut plan = CatalogPlan::default();

    for _ in 0..config.categories {
        plan.categories.push(category::Model {
            id: random_id(rng),
            name: pick(rng, DEPARTMENTS).to_string(),
            description: Some(Sentence(6..12).fake_with_rng(rng)),
            created_at: now,
            updated_at: now,
        });
    }

    for _ in 0..config.suppliers {
        plan.suppliers.push(supplier::Model {
            id: random_id(rng),
            name: CompanyName().fake_with_rng(rng),
            contact_name: Some(Name().fake_with_rng(rng)),
            email: Some(SafeEmail().fake_with_rng(rng)),
            phone: Some(PhoneNumber().fake_with_rng(rng)),
            address: Some(street_address(rng)),
            lead_time_days: rng.gen_range(3..=21),
            reliability_score: Decimal::from(rng.gen_range(70..=100_i32)),
            created_at: now,
            updated_at: now,
        });
    }

    for category in &plan.categories {
        for _ in 0..config.products_per_category {
            let supplier = plan.suppliers.choose(rng).ok_or_else(|| {
                ServiceError::ValidationError("catalog needs at least one supplier".to_string())
            })?;
            plan.products.push(product::Model {
                id: random_id(rng),
                name: product_name(rng),
                description: Some(Sentence(8..16).fake_with_rng(rng)),
                price: Decimal::new(rng.gen_range(500..=50_000), 2),
                quantity: rng.gen_range(0..=200),
                category_id: Some(category.id),
                sku: Some(sku(rng)),
                low_stock_threshold: rng.gen_range(5..=20),
                supplier_id: Some(supplier.id),
                lead_time_days: supplier.lead_time_days,
                created_at: now,
                updated_at: now,
            });
        }
    }

    if plan.products.is_empty() {
        return Ok(plan);
    }

    let low = config.orders_per_month * 4 / 5;
    let high = config.orders_per_month * 6 / 5;
    let max_items = (config.max_order_items as usize).clamp(1, plan.products.len());

    for offset in (0..=historical_months).rev() {
        let anchor = months_before(now, offset)?;
        let multiplier = seasonal_multiplier(seasonal, anchor.month0());
        let orders = (f64::from(rng.gen_range(low..=high)) * multiplier).floor() as u32;
        // The current month only has days up to today
        let last_day = if offset == 0 { now.day().min(28) } else { 28 };

        for _ in 0..orders {
            let day = rng.gen_range(1..=last_day);
            let placed_at = anchor.with_day(day).ok_or_else(|| {
                ServiceError::InternalError(format!("day {} is not valid for {}", day, anchor))
            })?;
            let order_id = random_id(rng);

            let item_count = rng.gen_range(1..=max_items);
            let mut total_amount = Decimal::ZERO;
            for product_index in index::sample(rng, plan.products.len(), item_count) {
                let product = &plan.products[product_index];
                let quantity: i32 = rng.gen_range(1..=5);
                total_amount += product.price * Decimal::from(quantity);
                plan.order_items.push(order_item::Model {
                    id: random_id(rng),
                    order_id,
                    product_id: product.id,
                    quantity,
                    unit_price: product.price,
                    created_at: placed_at,
                });
            }

            let notes = if rng.gen_bool(0.3) {
                Some(Sentence(4..10).fake_with_rng(rng))
            } else {
                None
            };
            plan.orders.push(order::Model {
                id: order_id,
                status: pick(rng, ORDER_STATUSES).to_string(),
                total_amount,
                customer_name: Some(Name().fake_with_rng(rng)),
                customer_email: Some(SafeEmail().fake_with_rng(rng)),
                shipping_address: Some(street_address(rng)),
                shipping_method: Some(pick(rng, SHIPPING_METHODS).to_string()),
                notes,
                payment_status: pick(rng, PAYMENT_STATUSES).to_string(),
                created_at: placed_at,
                updated_at: placed_at,
            });
        }
    }

    Ok(plan)
}

async fn insert_chunked<A>(db: &impl ConnectionTrait, rows: Vec<A>) -> Result<(), ServiceError>
where
    A: ActiveModelTrait + Clone + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
        <A::Entity as EntityTrait>::insert_many(chunk.to_vec())
            .exec_without_returning(db)
            .await?;
    }
    Ok(())
}

fn active<M, A>(models: &[M]) -> Vec<A>
where
    M: IntoActiveModel<A> + Clone,
    A: ActiveModelTrait,
{
    models
        .iter()
        .cloned()
        .map(|model| model.into_active_model().reset_all())
        .collect()
}

/// Writes a planned catalog in one transaction.
pub async fn persist_catalog(
    db: &DatabaseConnection,
    plan: &CatalogPlan,
) -> Result<CatalogSummary, ServiceError> {
    let categories: Vec<category::ActiveModel> = active(&plan.categories);
    let suppliers: Vec<supplier::ActiveModel> = active(&plan.suppliers);
    let products: Vec<product::ActiveModel> = active(&plan.products);
    let orders: Vec<order::ActiveModel> = active(&plan.orders);
    let order_items: Vec<order_item::ActiveModel> = active(&plan.order_items);

    with_transaction(db, move |txn| {
        Box::pin(async move {
            insert_chunked(txn, categories).await?;
            insert_chunked(txn, suppliers).await?;
            insert_chunked(txn, products).await?;
            insert_chunked(txn, orders).await?;
            insert_chunked(txn, order_items).await?;
            Ok::<_, ServiceError>(())
        })
    })
    .await?;

    let summary = plan.summary();
    info!(
        categories = summary.categories,
        suppliers = summary.suppliers,
        products = summary.products,
        orders = summary.orders,
        order_items = summary.order_items,
        "Demo catalog written"
    );
    Ok(summary)
}

/// Deletes all demo rows, derived tables included, children first.
pub async fn clear_demo_data(db: &DatabaseConnection) -> Result<(), ServiceError> {
    with_transaction(db, |txn| {
        Box::pin(async move {
            forecast::Entity::delete_many().exec(txn).await?;
            product_history::Entity::delete_many().exec(txn).await?;
            order_item::Entity::delete_many().exec(txn).await?;
            order::Entity::delete_many().exec(txn).await?;
            product::Entity::delete_many().exec(txn).await?;
            supplier::Entity::delete_many().exec(txn).await?;
            category::Entity::delete_many().exec(txn).await?;
            Ok::<_, ServiceError>(())
        })
    })
    .await?;
    info!("Cleared existing demo data");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::calendar::DEFAULT_SEASONAL_MULTIPLIERS;
    use chrono::TimeZone;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::{HashMap, HashSet};

    fn small_config() -> CatalogConfig {
        CatalogConfig {
            categories: 3,
            products_per_category: 4,
            suppliers: 5,
            orders_per_month: 10,
            max_order_items: 3,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 8, 30, 0).unwrap()
    }

    fn plan(seed: u64) -> CatalogPlan {
        plan_catalog(
            &small_config(),
            12,
            &DEFAULT_SEASONAL_MULTIPLIERS,
            now(),
            &mut StdRng::seed_from_u64(seed),
        )
        .unwrap()
    }

    #[test]
    fn catalog_sizes_follow_config() {
        let plan = plan(1);
        assert_eq!(plan.categories.len(), 3);
        assert_eq!(plan.suppliers.len(), 5);
        assert_eq!(plan.products.len(), 12);
        assert!(!plan.orders.is_empty());
    }

    #[test]
    fn products_reference_catalog_rows() {
        let plan = plan(2);
        let categories: HashSet<_> = plan.categories.iter().map(|c| c.id).collect();
        let suppliers: HashMap<_, _> = plan
            .suppliers
            .iter()
            .map(|s| (s.id, s.lead_time_days))
            .collect();

        for product in &plan.products {
            assert!(categories.contains(&product.category_id.unwrap()));
            let lead_time = suppliers[&product.supplier_id.unwrap()];
            assert_eq!(product.lead_time_days, lead_time);
            assert!((0..=200).contains(&product.quantity));
            assert!((5..=20).contains(&product.low_stock_threshold));
            let sku = product.sku.as_deref().unwrap();
            assert_eq!(sku.len(), 8);
            assert_eq!(sku, sku.to_ascii_uppercase());
            assert!(product.price >= Decimal::new(500, 2));
            assert!(product.price <= Decimal::new(50_000, 2));
        }
    }

    #[test]
    fn order_items_are_distinct_and_totals_add_up() {
        let plan = plan(3);
        let mut items: HashMap<Uuid, Vec<&order_item::Model>> = HashMap::new();
        for item in &plan.order_items {
            items.entry(item.order_id).or_default().push(item);
        }

        for order in &plan.orders {
            let lines = &items[&order.id];
            assert!((1..=3).contains(&lines.len()));
            let distinct: HashSet<_> = lines.iter().map(|l| l.product_id).collect();
            assert_eq!(distinct.len(), lines.len());
            let total: Decimal = lines
                .iter()
                .map(|l| l.unit_price * Decimal::from(l.quantity))
                .sum();
            assert_eq!(order.total_amount, total);
            assert!(lines.iter().all(|l| (1..=5).contains(&l.quantity)));
            assert!(lines.iter().all(|l| l.created_at == order.created_at));
        }
    }

    #[test]
    fn orders_stay_within_the_window() {
        let plan = plan(4);
        let earliest = months_before(now(), 12).unwrap();
        for order in &plan.orders {
            assert!(order.created_at <= now());
            assert!(order.created_at.date_naive() >= earliest.with_day(1).unwrap().date_naive());
            assert!(order.created_at.day() <= 28);
        }
    }

    #[test]
    fn monthly_order_counts_follow_seasonality() {
        let plan = plan(5);
        let mut per_month: HashMap<u32, usize> = HashMap::new();
        for order in &plan.orders {
            *per_month.entry(order.created_at.month()).or_default() += 1;
        }
        // 8..=12 orders before scaling; December 1.5x, February 0.7x
        let december = per_month.get(&12).copied().unwrap_or_default();
        let february = per_month.get(&2).copied().unwrap_or_default();
        assert!((12..=18).contains(&december), "december: {}", december);
        assert!((5..=8).contains(&february), "february: {}", february);
    }

    #[test]
    fn same_seed_same_catalog() {
        assert_eq!(plan(9), plan(9));
        assert_ne!(plan(9).products[0].id, plan(10).products[0].id);
    }
}
