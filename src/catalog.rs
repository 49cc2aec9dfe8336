use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::models::{Category, Frequency, IndicatorSpec};

/// Template for a well-known series: default metadata plus the cadence its
/// collector runs at.
#[derive(Debug, Clone)]
pub struct SeriesTemplate {
    pub name: &'static str,
    pub category: Category,
    pub unit: &'static str,
    pub description: &'static str,
    pub source_hint: &'static str,
    pub frequency: Frequency,
}

impl SeriesTemplate {
    pub fn to_spec(&self) -> IndicatorSpec {
        IndicatorSpec {
            name: self.name.to_string(),
            category: self.category,
            unit: self.unit.to_string(),
            description: Some(self.description.to_string()),
            source_hint: Some(self.source_hint.to_string()),
        }
    }
}

macro_rules! series {
    ($name:expr, $cat:expr, $unit:expr, $desc:expr, $hint:expr, $freq:expr) => {
        SeriesTemplate {
            name: $name,
            category: $cat,
            unit: $unit,
            description: $desc,
            source_hint: $hint,
            frequency: $freq,
        }
    };
}

// ============================================================================
// STATIC SERIES CATALOG (Lazy initialization, O(1) lookup)
// ============================================================================

static KNOWN_SERIES: Lazy<Vec<SeriesTemplate>> = Lazy::new(|| {
    vec![
        // Exchange rates against the Real, daily PTAX-style quotes
        series!("Dólar", Category::Currency, "R$",
                "Cotação do Dólar (USD) em relação ao Real",
                "https://olinda.bcb.gov.br/olinda/servico/PTAX/", Frequency::Daily),
        series!("Euro", Category::Currency, "R$",
                "Cotação do Euro (EUR) em relação ao Real",
                "https://olinda.bcb.gov.br/olinda/servico/PTAX/", Frequency::Daily),
        series!("Libra Esterlina", Category::Currency, "R$",
                "Cotação da Libra Esterlina (GBP) em relação ao Real",
                "https://olinda.bcb.gov.br/olinda/servico/PTAX/", Frequency::Daily),
        series!("Peso Argentino", Category::Currency, "R$",
                "Cotação do Peso Argentino (ARS) em relação ao Real",
                "https://olinda.bcb.gov.br/olinda/servico/PTAX/", Frequency::Daily),

        // Inflation indices, published monthly
        series!("IPCA", Category::Index, "%",
                "Índice Nacional de Preços ao Consumidor Amplo",
                "https://servicodados.ibge.gov.br/", Frequency::Monthly),
        series!("IGP-M", Category::Index, "%",
                "Índice Geral de Preços do Mercado",
                "https://servicodados.ibge.gov.br/", Frequency::Monthly),
        series!("INPC", Category::Index, "%",
                "Índice Nacional de Preços ao Consumidor",
                "https://servicodados.ibge.gov.br/", Frequency::Monthly),

        // Price-surveyed goods
        series!("Cesta Básica", Category::Commodity, "R$",
                "Custo médio da cesta básica de alimentos",
                "https://www.dieese.org.br/", Frequency::Monthly),
    ]
});

/// HashMap for O(1) name -> index lookup
static SERIES_MAP: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    KNOWN_SERIES
        .iter()
        .enumerate()
        .map(|(idx, s)| (s.name, idx))
        .collect()
});

pub fn known_series() -> &'static [SeriesTemplate] {
    &KNOWN_SERIES
}

pub fn find(name: &str) -> Option<&'static SeriesTemplate> {
    SERIES_MAP.get(name).map(|&idx| &KNOWN_SERIES[idx])
}
