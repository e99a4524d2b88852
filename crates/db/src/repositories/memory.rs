use std::collections::HashMap;

use tokio::sync::RwLock;

use vendaflow_core::domain::analysis::AnalysisRecord;
use vendaflow_core::domain::lead::{Lead, LeadId};
use vendaflow_core::domain::product::Product;
use vendaflow_core::domain::settings::Setting;

use super::{
    AnalysisRepository, LeadRepository, ProductRepository, RepositoryError, SettingsRepository,
};

#[derive(Default)]
pub struct InMemoryLeadRepository {
    leads: RwLock<HashMap<String, Lead>>,
}

#[async_trait::async_trait]
impl LeadRepository for InMemoryLeadRepository {
    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<Lead>, RepositoryError> {
        let leads = self.leads.read().await;
        Ok(leads.values().find(|lead| lead.phone_number == phone_number).cloned())
    }

    async fn find_by_id(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        let leads = self.leads.read().await;
        Ok(leads.get(&id.0).cloned())
    }

    async fn save(&self, lead: Lead) -> Result<(), RepositoryError> {
        let mut leads = self.leads.write().await;
        leads.insert(lead.id.0.clone(), lead);
        Ok(())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Lead>, RepositoryError> {
        let leads = self.leads.read().await;
        let mut recent: Vec<Lead> = leads.values().cloned().collect();
        recent.sort_by(|left, right| right.last_interaction.cmp(&left.last_interaction));
        recent.truncate(limit as usize);
        Ok(recent)
    }
}

/// Products kept in insertion order, matching the catalog order of the SQL store.
#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<Vec<Product>>,
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list_featured(&self, limit: u32) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.iter().filter(|product| product.featured).take(limit as usize).cloned().collect())
    }

    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.products.read().await.clone())
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        match products.iter_mut().find(|existing| existing.id == product.id) {
            Some(existing) => *existing = product,
            None => products.push(product),
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySettingsRepository {
    settings: RwLock<HashMap<String, Setting>>,
}

#[async_trait::async_trait]
impl SettingsRepository for InMemorySettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<Setting>, RepositoryError> {
        let settings = self.settings.read().await;
        Ok(settings.get(key).cloned())
    }

    async fn upsert(&self, setting: Setting) -> Result<(), RepositoryError> {
        let mut settings = self.settings.write().await;
        let description = setting.description.clone().or_else(|| {
            settings.get(&setting.key).and_then(|existing| existing.description.clone())
        });
        settings.insert(setting.key.clone(), Setting { description, ..setting });
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Setting>, RepositoryError> {
        let settings = self.settings.read().await;
        let mut all: Vec<Setting> = settings.values().cloned().collect();
        all.sort_by(|left, right| left.key.cmp(&right.key));
        Ok(all)
    }
}

#[derive(Default)]
pub struct InMemoryAnalysisRepository {
    records: RwLock<Vec<AnalysisRecord>>,
}

#[async_trait::async_trait]
impl AnalysisRepository for InMemoryAnalysisRepository {
    async fn record(&self, record: AnalysisRecord) -> Result<(), RepositoryError> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn list_for_lead(
        &self,
        lead_id: &LeadId,
    ) -> Result<Vec<AnalysisRecord>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|record| &record.lead_id == lead_id).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use vendaflow_core::domain::lead::Lead;
    use vendaflow_core::domain::product::{Product, ProductId};
    use vendaflow_core::domain::settings::{Setting, SettingValue};

    use crate::repositories::{
        InMemoryLeadRepository, InMemoryProductRepository, InMemorySettingsRepository,
        LeadRepository, ProductRepository, SettingsRepository,
    };

    #[tokio::test]
    async fn in_memory_lead_repo_finds_by_phone_and_id() {
        let repo = InMemoryLeadRepository::default();
        let lead = Lead::new("5511999999999", Utc::now());

        repo.save(lead.clone()).await.expect("save lead");

        assert_eq!(repo.find_by_phone("5511999999999").await.expect("find"), Some(lead.clone()));
        assert_eq!(repo.find_by_id(&lead.id).await.expect("find"), Some(lead));
        assert_eq!(repo.find_by_phone("0000").await.expect("find"), None);
    }

    #[tokio::test]
    async fn in_memory_product_repo_keeps_insertion_order() {
        let repo = InMemoryProductRepository::default();
        for index in 0..4 {
            repo.save(Product {
                id: ProductId(format!("P{index}")),
                name: format!("Piso {index}"),
                description: None,
                category: "Pisos Cerâmicos".to_string(),
                original_price: Decimal::from(50),
                promotional_price: Decimal::from(45),
                unit: "m²".to_string(),
                featured: index != 1,
                image_url: None,
                stock: 1,
            })
            .await
            .expect("save product");
        }

        let featured = repo.list_featured(2).await.expect("featured");
        let ids: Vec<_> = featured.iter().map(|product| product.id.0.as_str()).collect();
        assert_eq!(ids, vec!["P0", "P2"]);
    }

    #[tokio::test]
    async fn in_memory_settings_repo_upserts() {
        let repo = InMemorySettingsRepository::default();
        repo.upsert(Setting {
            key: "budget_margin".to_string(),
            value: SettingValue::Number(10.0),
            description: Some("Margem".to_string()),
            updated_at: Utc::now(),
        })
        .await
        .expect("save");
        repo.upsert(Setting {
            key: "budget_margin".to_string(),
            value: SettingValue::Number(15.0),
            description: None,
            updated_at: Utc::now(),
        })
        .await
        .expect("update");

        let stored = repo.get("budget_margin").await.expect("get").expect("exists");
        assert_eq!(stored.value, SettingValue::Number(15.0));
        assert_eq!(stored.description.as_deref(), Some("Margem"));
    }
}
