use std::collections::HashSet;

use vendaflow_core::domain::settings::keys;
use vendaflow_db::repositories::{ProductRepository, SqlProductRepository};
use vendaflow_db::{connect_with_settings, migrations, CatalogSeed};

type SeedContractTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
}

#[test]
fn seed_products_have_unique_ids_and_sane_prices() -> SeedContractTestResult {
    let products = CatalogSeed::products();
    let ids: HashSet<_> = products.iter().map(|product| product.id.0.clone()).collect();
    require_eq!(ids.len(), products.len());

    for product in &products {
        require!(
            product.promotional_price <= product.original_price,
            "{} is more expensive on promotion",
            product.name
        );
        require!(!product.category.is_empty(), "{} has no category", product.name);
    }

    let featured = products.iter().filter(|product| product.featured).count();
    require!(featured >= 3, "the catalog message needs at least three featured products");
    Ok(())
}

#[tokio::test]
async fn seed_populates_catalog_and_default_settings() -> SeedContractTestResult {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|err| format!("connect: {err}"))?;
    migrations::run_pending(&pool).await.map_err(|err| format!("migrate: {err}"))?;

    let result = CatalogSeed::load(&pool).await.map_err(|err| format!("seed: {err}"))?;
    require_eq!(result.products_seeded, CatalogSeed::products().len());
    for key in [keys::COMPANY_NAME, keys::BOT_NAME, keys::BUDGET_MARGIN, keys::AI_DRIVEN_BOT] {
        require!(result.settings_seeded.contains(&key), "{key} should be seeded");
    }

    let featured = SqlProductRepository::new(pool)
        .list_featured(3)
        .await
        .map_err(|err| format!("list featured: {err}"))?;
    require_eq!(featured.len(), 3);
    Ok(())
}
