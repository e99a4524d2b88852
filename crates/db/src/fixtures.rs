use std::sync::Arc;

use rust_decimal::Decimal;

use vendaflow_core::domain::product::{Product, ProductId, DEFAULT_UNIT};
use vendaflow_core::domain::settings::{keys, SettingValue};

use crate::connection::DbPool;
use crate::repositories::{
    ProductRepository, RepositoryError, SettingsRepository, SqlProductRepository,
    SqlSettingsRepository,
};
use crate::settings_store::SettingsStore;

struct SeedProduct {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: &'static str,
    original_cents: i64,
    promotional_cents: i64,
    featured: bool,
    stock: i64,
}

/// Demo flooring catalog. IDs are fixed so reseeding updates in place.
const SEED_PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        id: "PROD-SEED-001",
        name: "Porcelanato Polido Carrara 60x60",
        description: "Porcelanato retificado com acabamento polido, padrão mármore branco.",
        category: "Porcelanatos",
        original_cents: 8990,
        promotional_cents: 6990,
        featured: true,
        stock: 320,
    },
    SeedProduct {
        id: "PROD-SEED-002",
        name: "Piso Cerâmico Amadeirado Carvalho",
        description: "Piso cerâmico PEI 4 com textura de madeira para áreas internas.",
        category: "Pisos Cerâmicos",
        original_cents: 4590,
        promotional_cents: 3490,
        featured: true,
        stock: 540,
    },
    SeedProduct {
        id: "PROD-SEED-003",
        name: "Revestimento 3D Branco Acetinado",
        description: "Revestimento de parede com relevo geométrico.",
        category: "Revestimentos",
        original_cents: 7490,
        promotional_cents: 5990,
        featured: true,
        stock: 180,
    },
    SeedProduct {
        id: "PROD-SEED-004",
        name: "Porcelanato Cimento Queimado 90x90",
        description: "Porcelanato acetinado de grande formato, efeito cimento.",
        category: "Porcelanatos",
        original_cents: 12990,
        promotional_cents: 10990,
        featured: false,
        stock: 95,
    },
];

const SEED_SETTINGS: &[(&str, SeedValue, &str)] = &[
    (keys::COMPANY_NAME, SeedValue::Text("Pereira Acabamentos"), "Nome da empresa exibido pelo bot"),
    (keys::BOT_NAME, SeedValue::Text("Lia"), "Nome da assistente virtual"),
    (keys::BUDGET_MARGIN, SeedValue::Number(10.0), "Margem de segurança (%) aplicada ao orçamento"),
    (keys::AI_DRIVEN_BOT, SeedValue::Flag(false), "Usar IA para responder clientes"),
];

#[derive(Clone, Copy)]
enum SeedValue {
    Text(&'static str),
    Number(f64),
    Flag(bool),
}

impl From<SeedValue> for SettingValue {
    fn from(value: SeedValue) -> Self {
        match value {
            SeedValue::Text(text) => SettingValue::from(text),
            SeedValue::Number(number) => SettingValue::Number(number),
            SeedValue::Flag(flag) => SettingValue::Bool(flag),
        }
    }
}

/// Demo catalog and default settings for a fresh install.
pub struct CatalogSeed;

impl CatalogSeed {
    pub fn products() -> Vec<Product> {
        SEED_PRODUCTS
            .iter()
            .map(|seed| Product {
                id: ProductId(seed.id.to_string()),
                name: seed.name.to_string(),
                description: Some(seed.description.to_string()),
                category: seed.category.to_string(),
                original_price: Decimal::new(seed.original_cents, 2),
                promotional_price: Decimal::new(seed.promotional_cents, 2),
                unit: DEFAULT_UNIT.to_string(),
                featured: seed.featured,
                image_url: None,
                stock: seed.stock,
            })
            .collect()
    }

    /// Upserts the demo products. Settings are only written when absent so an
    /// operator's values survive a reseed.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let products = SqlProductRepository::new(pool.clone());
        let settings_repo: Arc<dyn SettingsRepository> =
            Arc::new(SqlSettingsRepository::new(pool.clone()));
        let settings = SettingsStore::new(settings_repo.clone());

        let mut products_seeded = 0;
        for product in Self::products() {
            products.save(product).await?;
            products_seeded += 1;
        }

        let mut settings_seeded = Vec::new();
        for (key, value, description) in SEED_SETTINGS {
            if settings_repo.get(key).await?.is_none() {
                settings.set(key, *value, Some(*description)).await?;
                settings_seeded.push(*key);
            }
        }

        tracing::info!(
            event_name = "system.seed.loaded",
            products_seeded,
            settings_seeded = settings_seeded.len(),
            "catalog seed loaded"
        );

        Ok(SeedResult { products_seeded, settings_seeded })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let products = SqlProductRepository::new(pool.clone()).list_all().await?;
        let settings = SqlSettingsRepository::new(pool.clone());

        let mut checks = Vec::new();
        for seed in SEED_PRODUCTS {
            let present = products.iter().any(|product| product.id.0 == seed.id);
            checks.push(VerificationCheck {
                name: format!("product {}", seed.id),
                passed: present,
            });
        }
        for (key, _, _) in SEED_SETTINGS {
            let present = settings.get(key).await?.is_some();
            checks.push(VerificationCheck { name: format!("setting {key}"), passed: present });
        }

        let all_passed = checks.iter().all(|check| check.passed);
        Ok(VerificationResult { all_passed, checks })
    }

    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;
        for seed in SEED_PRODUCTS {
            sqlx::query("DELETE FROM product WHERE id = ?").bind(seed.id).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub products_seeded: usize,
    pub settings_seeded: Vec<&'static str>,
}

#[derive(Debug)]
pub struct VerificationCheck {
    pub name: String,
    pub passed: bool,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_passed: bool,
    pub checks: Vec<VerificationCheck>,
}

#[cfg(test)]
mod tests {
    use vendaflow_core::domain::settings::keys;

    use super::CatalogSeed;
    use crate::repositories::{ProductRepository, SqlProductRepository};
    use crate::settings_store::SettingsStore;
    use crate::{connect_with_settings, migrations, repositories::SqlSettingsRepository};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn seed_is_idempotent_and_verifiable() {
        let pool = setup().await;

        let first = CatalogSeed::load(&pool).await.expect("first load");
        assert_eq!(first.products_seeded, 4);
        assert_eq!(first.settings_seeded.len(), 4);

        let second = CatalogSeed::load(&pool).await.expect("second load");
        assert!(second.settings_seeded.is_empty());

        let verification = CatalogSeed::verify(&pool).await.expect("verify");
        assert!(verification.all_passed, "{:?}", verification.checks);

        let featured = SqlProductRepository::new(pool.clone()).list_featured(3).await.expect("list");
        assert_eq!(featured.len(), 3);
    }

    #[tokio::test]
    async fn reseed_keeps_operator_settings() {
        let pool = setup().await;
        let store = SettingsStore::new(std::sync::Arc::new(SqlSettingsRepository::new(pool.clone())));
        store.set(keys::BOT_NAME, "Bia", None).await.expect("operator value");

        CatalogSeed::load(&pool).await.expect("load");

        assert_eq!(store.text(keys::BOT_NAME).await.expect("read").as_deref(), Some("Bia"));
        assert!(!store.flag(keys::AI_DRIVEN_BOT).await.expect("read"));
    }

    #[tokio::test]
    async fn clean_removes_seeded_products() {
        let pool = setup().await;
        CatalogSeed::load(&pool).await.expect("load");
        CatalogSeed::clean(&pool).await.expect("clean");

        let verification = CatalogSeed::verify(&pool).await.expect("verify");
        assert!(!verification.all_passed);
    }
}
