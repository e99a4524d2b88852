use vendaflow_core::domain::lead::{Author, HistoryEntry};
use vendaflow_core::domain::product::Product;
use vendaflow_core::flows::LeadStage;

pub const EMPTY_CATALOG_CONTEXT: &str = "Nenhum produto cadastrado no momento.";

/// Instructions for AI mode, where the model holds the whole conversation.
pub fn sales_system_prompt(business_name: &str, bot_name: &str) -> String {
    format!(
        "Você é {bot_name}, consultora de vendas virtual da {business_name}, uma loja de pisos, \
porcelanatos e acabamentos. Atenda o cliente pelo WhatsApp com simpatia e objetividade, \
usando mensagens curtas e em português do Brasil. Descubra qual ambiente o cliente quer \
reformar, o estilo desejado e a metragem aproximada. Quando o cliente demonstrar interesse, \
ofereça montar um orçamento e peça a metragem em m². Nunca invente preços ou produtos; se não \
souber algo, diga que um vendedor da {business_name} entrará em contato."
    )
}

pub fn suggestion_prompt(company_name: &str, context: &str) -> String {
    format!(
        "Você é o assistente de um vendedor na {company_name}. \n\
Seu objetivo é sugerir uma resposta curta, profissional e persuasiva para o cliente (lead).\n\
Contexto da empresa: Loja de pisos, porcelanatos e acabamentos.\n\
Contexto adicional: {context}\n\
Gere apenas a sugestão de texto para o vendedor enviar."
    )
}

/// Company, stage and full catalog listing handed to the suggestion prompt.
pub fn suggestion_context(company_name: &str, stage: &LeadStage, products: &[Product]) -> String {
    let catalog = if products.is_empty() {
        EMPTY_CATALOG_CONTEXT.to_string()
    } else {
        products.iter().map(Product::context_line).collect::<Vec<_>>().join("\n")
    };
    format!("Empresa: {company_name}\nEstágio Atual do Lead: {stage}\nProdutos em Catálogo:\n{catalog}")
}

/// Agent replies are folded into the bot side so the model sees a two-party chat.
pub fn suggestion_history(history: &[HistoryEntry]) -> Vec<HistoryEntry> {
    history
        .iter()
        .map(|entry| HistoryEntry {
            author: match entry.author {
                Author::Customer => Author::Customer,
                Author::Bot | Author::Agent => Author::Bot,
            },
            text: entry.text.clone(),
            timestamp: entry.timestamp,
        })
        .collect()
}
