//! Customer-facing texts for the fixed sales flow.

use rust_decimal::Decimal;

use crate::domain::product::Product;
use crate::flows::measurement::BudgetSummary;

pub fn greeting(business_name: &str) -> String {
    format!("Olá! 👋 Bem-vindo(a) à *{business_name}*! 🏠✨")
}

pub fn ask_name(bot_name: &str) -> String {
    format!(
        "Sou a *{bot_name}*, sua assistente virtual. Para te atender melhor, me diga seu *nome*, por favor? 😊"
    )
}

pub fn thank_name(name: &str) -> String {
    format!("Prazer, *{name}*! 🤝")
}

pub fn ask_email() -> String {
    "Qual seu *e-mail* para enviarmos nossos melhores orçamentos? (Ou digite *\"pular\"*)"
        .to_string()
}

pub fn category_menu() -> String {
    "Perfeito! O que você está procurando hoje? 😊\n\n1️⃣ Porcelanatos\n2️⃣ Pisos Cerâmicos\n3️⃣ Revestimentos\n4️⃣ Ver Promoções\n\n_Digite o número da opção desejada._"
        .to_string()
}

pub fn empty_catalog(contact_phone: &str) -> String {
    format!(
        "🔍 Ainda estamos cadastrando nosso catálogo!\n\nEm breve teremos produtos incríveis aqui. Fale com nossa equipe pelo *{contact_phone}* para ver todas as opções. 😊"
    )
}

pub fn featured_catalog(products: &[Product]) -> String {
    let mut text = String::from("🔥 *DESTAQUES DO MÊS* 🔥\n\n");
    for (index, product) in products.iter().enumerate() {
        text.push_str(&format!(
            "{}. *{}*\n💰 De R$ {} por *R$ {}/{}*\n\n",
            index + 1,
            product.name,
            product.original_price.normalize(),
            product.promotional_price.normalize(),
            product.unit
        ));
    }
    text.push_str("Deseja um *orçamento*? Digite o número do produto.");
    text
}

pub fn ask_measurement(margin_pct: Decimal) -> String {
    format!(
        "📐 *Simulação de Orçamento*\n\nÓtima escolha! Aplicamos uma margem de segurança de *{}%* para evitar desperdício.\n\nMe diga a *metragem em m²* que você precisa cobrir:",
        margin_pct.normalize()
    )
}

pub fn invalid_measurement() -> String {
    "Por favor, informe apenas o número da metragem. Ex: *25*".to_string()
}

pub fn budget_summary(summary: &BudgetSummary) -> String {
    format!(
        "✅ *Resumo do Orçamento*\n\n📦 Área informada: *{} m²*\n➕ Margem de segurança ({}%): *{} m²*\n📐 *Total a comprar: {} m²*\n\n💬 Nosso time irá preparar o orçamento completo e entrar em contato em breve!\n\nPosso te ajudar em mais alguma coisa? Digite *menu* para recomeçar. 😊",
        summary.area.normalize(),
        summary.margin_pct.normalize(),
        summary.margin_area,
        summary.total_area
    )
}

pub fn reengage() -> String {
    "Como posso te ajudar? Digite *menu* para ver as opções. 😊".to_string()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{ask_measurement, budget_summary, featured_catalog};
    use crate::domain::product::{Product, ProductId};
    use crate::flows::measurement::BudgetSummary;

    #[test]
    fn catalog_lists_products_with_both_prices() {
        let products = vec![Product {
            id: ProductId("PROD-1".to_string()),
            name: "Porcelanato Carrara".to_string(),
            description: None,
            category: "Porcelanatos".to_string(),
            original_price: Decimal::new(8990, 2),
            promotional_price: Decimal::new(6990, 2),
            unit: "m²".to_string(),
            featured: true,
            image_url: None,
            stock: 10,
        }];

        let text = featured_catalog(&products);
        assert!(text.starts_with("🔥 *DESTAQUES DO MÊS* 🔥\n\n"));
        assert!(text.contains("1. *Porcelanato Carrara*\n💰 De R$ 89.9 por *R$ 69.9/m²*"));
        assert!(text.ends_with("Digite o número do produto."));
    }

    #[test]
    fn margin_is_rendered_without_trailing_zeros() {
        assert!(ask_measurement(Decimal::new(1000, 2)).contains("*10%*"));
        assert!(ask_measurement(Decimal::new(125, 1)).contains("*12.5%*"));
    }

    #[test]
    fn summary_reports_area_margin_and_total() {
        let summary = BudgetSummary::compute(Decimal::new(255, 1), Decimal::from(10));
        let text = budget_summary(&summary);
        assert!(text.contains("Área informada: *25.5 m²*"));
        assert!(text.contains("Margem de segurança (10%): *2.55 m²*"));
        assert!(text.contains("*Total a comprar: 28.05 m²*"));
    }
}
