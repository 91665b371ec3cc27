//! Prompt templates for the three market-commentary stages and their
//! offline fallback tables.

use std::fmt;
use std::str::FromStr;

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculator::CalculationPolicy;
use crate::error::{ImmoError, Result};
use crate::models::{DerivedMetrics, InvestmentRequest, Range};
use crate::report::{format_eur, format_rate_fr};

/// System message sent with every completion request.
pub const SYSTEM_INSTRUCTION: &str = "Tu es un expert en immobilier français. \
Réponds uniquement avec des tableaux markdown précis et des données réelles du marché 2025.";

/// Marker appended to every fallback table so it can never pass for live data.
pub const OFFLINE_NOTICE: &str = "*Données de démonstration (mode hors ligne), non issues du marché en temps réel*";

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Which canned prompt to send. Chosen by the caller, never inferred from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Comparable listings per sector (low / median / high budget).
    SearchListings,
    /// Neighborhood price, rent and yield overview.
    AnalyzeNeighborhoods,
    /// Top three listings within the net seller budget.
    TopListings,
}

impl Stage {
    /// Stages in the order a benchmark run issues them.
    pub const ALL: [Stage; 3] = [
        Stage::SearchListings,
        Stage::AnalyzeNeighborhoods,
        Stage::TopListings,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Stage::SearchListings => "search_listings",
            Stage::AnalyzeNeighborhoods => "analyze_neighborhoods",
            Stage::TopListings => "top_listings",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Stage::SearchListings => "Étape 1 : Recherche d'annonces correspondantes",
            Stage::AnalyzeNeighborhoods => "Étape 2 : Analyse des quartiers",
            Stage::TopListings => "Étape 3 : Top 3 des meilleures opportunités",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Stage {
    type Err = ImmoError;

    fn from_str(s: &str) -> Result<Self> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.key() == s.trim())
            .ok_or_else(|| ImmoError::InvalidArgument(format!("unknown stage '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Prompt building
// ---------------------------------------------------------------------------

/// Render the user prompt for `stage` with the default fee policy.
pub fn build_prompt(stage: Stage, request: &InvestmentRequest, metrics: &DerivedMetrics) -> String {
    build_prompt_with(stage, request, metrics, &CalculationPolicy::default())
}

pub fn build_prompt_with(
    stage: Stage,
    request: &InvestmentRequest,
    metrics: &DerivedMetrics,
    policy: &CalculationPolicy,
) -> String {
    let fees = fee_label(request, policy);
    match stage {
        Stage::SearchListings => search_listings_prompt(request, metrics, &fees),
        Stage::AnalyzeNeighborhoods => neighborhoods_prompt(request, metrics, &fees),
        Stage::TopListings => top_listings_prompt(request, metrics, &fees),
    }
}

/// "notaire 7,5%, honoraires 8,4%, frais d'agence 4-10%"
fn fee_label(request: &InvestmentRequest, policy: &CalculationPolicy) -> String {
    let band = &policy.realtor_fee_rate;
    format!(
        "notaire {}, honoraires {}, frais d'agence {}-{}",
        format_rate_fr(policy.notary_rate(request.property_age())),
        format_rate_fr(policy.agency_commission_rate),
        band_pct(band.min),
        format_rate_fr(band.max),
    )
}

fn band_pct(rate: rust_decimal::Decimal) -> String {
    format_rate_fr(rate).trim_end_matches('%').to_string()
}

fn goal_or_default(request: &InvestmentRequest) -> &str {
    if request.goal().is_empty() {
        "investissement locatif"
    } else {
        request.goal()
    }
}

fn search_listings_prompt(request: &InvestmentRequest, metrics: &DerivedMetrics, fees: &str) -> String {
    format!(
        "Agis comme un **chasseur immobilier expert**.
Propose uniquement des **tableaux comparatifs d'annonces immobilières** correspondant au profil client, sans texte explicatif.

### DONNÉES CLIENT ###
- Budget global: {budget} (incluant prix, {fees})
- Budget travaux additionnel: {works}
- Ville: {city}
- Typologie souhaitée: {unit} (environ {surface} m²)
- Objectif: {goal}

### MÉTHODE ###
1. Budget net vendeur maximum: {net}
2. Trouve **3 annonces représentatives par secteur** (bas, médian, haut) avec surface, prix affiché et lien.
3. Estime le loyer 2025 (fourchette basse/haute) à partir des loyers au m² et d'annonces locatives réelles.
4. Calcule la rentabilité brute (fourchette basse/haute).
5. Un tableau distinct par secteur pertinent.

### FORMAT ATTENDU ###
| Niveau budget | Localisation (secteur) | Type | Surface | Prix affiché (€) | Lien annonce | Loyer estimé 2025 (€/mois) | Rendement brut estimé (%) |",
        budget = format_eur(request.total_budget()),
        fees = fees,
        works = format_eur(request.renovation_budget()),
        city = request.city(),
        unit = request.unit_type(),
        surface = metrics.surface_sqm,
        goal = goal_or_default(request),
        net = format_eur(metrics.max_net_seller_budget),
    )
}

fn neighborhoods_prompt(request: &InvestmentRequest, metrics: &DerivedMetrics, fees: &str) -> String {
    let goal = goal_or_default(request);
    format!(
        "Agis comme un **expert en investissement immobilier**.
Analyse la ville de {city} et ses quartiers selon le budget et le projet du client. Fournis UNIQUEMENT un tableau.

### DONNÉES CLIENT ###
- Ville: {city}
- Budget global: {budget} ({fees})
- Budget net vendeur: {net}
- Projet: {goal}
- Typologie: {unit}
- Fourchette de prix de référence: {price}
- Loyer mensuel de référence: {rent}

### MÉTHODE ###
1. Identifie les quartiers principaux de {city}.
2. Pour chaque quartier: prix d'achat moyen (bas/haut, annonces 2025), loyer mensuel estimé (bas/haut, 2025), rendement brut (%) (bas/haut).
3. Évalue la pertinence de chaque quartier pour l'objectif « {goal} ».

### FORMAT ATTENDU ###
| Quartier | Prix d'achat (bas/haut) | Loyer estimé mensuel (bas/haut) | Rendement brut (%) (bas/haut) | Pertinence ({goal}) |",
        city = request.city(),
        budget = format_eur(request.total_budget()),
        fees = fees,
        net = format_eur(metrics.max_net_seller_budget),
        goal = goal,
        unit = request.unit_type(),
        price = eur_range(&metrics.purchase_price),
        rent = eur_range(&metrics.estimated_monthly_rent),
    )
}

fn top_listings_prompt(request: &InvestmentRequest, metrics: &DerivedMetrics, fees: &str) -> String {
    let net = metrics.max_net_seller_budget;
    format!(
        "Agis comme un **chasseur immobilier expert**.
Trouve les **3 meilleures annonces immobilières récentes** correspondant au budget du client. Fournis UNIQUEMENT un tableau, sans commentaire.

### DONNÉES CLIENT ###
- Ville: {city}
- Budget global: {budget} (incluant prix, {fees})
- Budget net vendeur maximum: {net}
- Typologie souhaitée: {unit}
- Objectif: {goal}

### MÉTHODE ###
1. Sélectionne 3 annonces dans le budget net vendeur:
   - Bas du budget (≈ {low})
   - Médian du budget (≈ {mid})
   - Haut du budget (≈ {net})
2. Loyers cohérents avec le marché locatif 2025, lien direct vers chaque annonce.

### FORMAT ATTENDU ###
| Niveau budget | Localisation | Type | Surface | Prix affiché (€) | Loyer estimé 2025 (€) | Rendement brut estimé (%) | Lien annonce |",
        city = request.city(),
        budget = format_eur(request.total_budget()),
        fees = fees,
        net = format_eur(net),
        unit = request.unit_type(),
        goal = goal_or_default(request),
        low = format_eur(net * dec!(0.7)),
        mid = format_eur(net * dec!(0.85)),
    )
}

fn eur_range(range: &Range) -> String {
    format!("{} à {}", format_eur(range.min), format_eur(range.max))
}

// ---------------------------------------------------------------------------
// Fallback content
// ---------------------------------------------------------------------------

/// Static demonstration table for `stage`, shown when the live call failed.
///
/// Figures are illustrative and unrelated to the request's metrics.
pub fn fallback_content(stage: Stage) -> &'static str {
    match stage {
        Stage::SearchListings => SEARCH_LISTINGS_FALLBACK,
        Stage::AnalyzeNeighborhoods => NEIGHBORHOODS_FALLBACK,
        Stage::TopListings => TOP_LISTINGS_FALLBACK,
    }
}

const SEARCH_LISTINGS_FALLBACK: &str = "\
| Niveau budget | Localisation (secteur) | Type | Surface | Prix affiché (€) | Lien annonce | Loyer estimé 2025 (€/mois) | Rendement brut (%) |
|---------------|------------------------|------|---------|------------------|--------------|----------------------------|--------------------|
| Bas | Nantes Centre-ville | T2 | 42 m² | 285 000 € | [Exemple](#) | 1 100-1 250 | 4.6-5.3% |
| Médian | Nantes Beaulieu | T2 | 46 m² | 345 000 € | [Exemple](#) | 1 300-1 450 | 4.5-5.0% |
| Haut | Nantes Île de Nantes | T2 | 52 m² | 405 000 € | [Exemple](#) | 1 500-1 650 | 4.4-4.9% |

*Données de démonstration (mode hors ligne), non issues du marché en temps réel*";

const NEIGHBORHOODS_FALLBACK: &str = "\
| Quartier | Prix d'achat (€) | Loyer estimé mensuel (€) | Rendement brut (%) | Pertinence |
|----------|------------------|--------------------------|--------------------|------------|
| Centre-ville | 280 000-320 000 | 1 200-1 400 | 4.5-6.0% | ★★★★★ |
| Beaulieu | 320 000-380 000 | 1 300-1 500 | 4.0-5.6% | ★★★★ |
| Île de Nantes | 380 000-420 000 | 1 400-1 600 | 4.0-5.0% | ★★★★★ |
| Hauts-Pavés | 250 000-300 000 | 1 000-1 300 | 4.8-6.2% | ★★★ |

*Données de démonstration (mode hors ligne), non issues du marché en temps réel*";

const TOP_LISTINGS_FALLBACK: &str = "\
| Niveau budget | Localisation | Type | Surface | Prix affiché (€) | Loyer estimé 2025 (€) | Rendement brut (%) | Lien annonce |
|---------------|--------------|------|---------|------------------|-----------------------|--------------------|--------------|
| Bas | Nantes Malakoff | T2 | 41 m² | 285 000 € | 1 150-1 300 | 4.8-5.5% | [Exemple](#) |
| Médian | Nantes Procé | T2 | 48 m² | 345 000 € | 1 350-1 500 | 4.7-5.2% | [Exemple](#) |
| Haut | Nantes Erdre | T2 | 53 m² | 405 000 € | 1 550-1 700 | 4.6-5.0% | [Exemple](#) |

*Données de démonstration (mode hors ligne), non issues du marché en temps réel*";
