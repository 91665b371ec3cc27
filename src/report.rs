//! Plain-text presentation helpers: EUR/percent formatting, a metrics
//! summary, and extraction of markdown tables from commentary content.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::models::{DerivedMetrics, InvestmentRequest, Range};

/// Yields at or above this percentage are rated positive.
pub const POSITIVE_YIELD_THRESHOLD: Decimal = dec!(4);

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Whole euros with French digit grouping, e.g. `280 000 €`.
pub fn format_eur(value: Decimal) -> String {
    let rounded = value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i128()
        .unwrap_or(0);
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }

    if rounded < 0 {
        format!("-{grouped} €")
    } else {
        format!("{grouped} €")
    }
}

/// Two decimals and a percent sign, e.g. `4.80%`.
pub fn format_percent(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}%")
}

pub fn format_eur_range(range: &Range) -> String {
    format!("{} - {}", format_eur(range.min), format_eur(range.max))
}

pub fn format_percent_range(range: &Range) -> String {
    format!("{} - {}", format_percent(range.min), format_percent(range.max))
}

/// Notary rate as shown to users and in prompts, e.g. `7,5%`.
pub fn format_rate_fr(rate: Decimal) -> String {
    let pct = (rate * Decimal::ONE_HUNDRED).normalize();
    format!("{}%", pct.to_string().replace('.', ","))
}

// ---------------------------------------------------------------------------
// YieldRating
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum YieldRating {
    Positive,
    Negative,
}

impl YieldRating {
    pub fn of(yield_pct: Decimal) -> Self {
        if yield_pct >= POSITIVE_YIELD_THRESHOLD {
            YieldRating::Positive
        } else {
            YieldRating::Negative
        }
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// One line per figure, in the order a results page shows them.
pub fn format_summary(request: &InvestmentRequest, metrics: &DerivedMetrics) -> String {
    let market = metrics
        .resolved_city
        .clone()
        .unwrap_or_else(|| format!("{} (bandes par défaut)", request.city()));

    let lines = [
        format!("Ville: {market}"),
        format!("Typologie: {} ({} m²)", request.unit_type(), metrics.surface_sqm),
        format!("Prix d'achat: {}", format_eur_range(&metrics.purchase_price)),
        format!("Frais de notaire: {}", format_eur_range(&metrics.notary_fees)),
        format!("Honoraires d'agence: {}", format_eur_range(&metrics.agency_commission)),
        format!("Frais d'agence immobilière: {}", format_eur_range(&metrics.realtor_fee_range)),
        format!("Travaux estimés: {}", format_eur(metrics.renovation_cost)),
        format!("Coût total HT: {}", format_eur_range(&metrics.total_cost_excl)),
        format!("Coût total TTC: {}", format_eur_range(&metrics.total_cost_incl)),
        format!("Loyer mensuel estimé: {}", format_eur_range(&metrics.estimated_monthly_rent)),
        format!("Budget net vendeur: {}", format_eur(metrics.max_net_seller_budget)),
        format!(
            "Rentabilité brute HT: {} ({:?})",
            format_percent_range(&metrics.gross_yield_excl),
            YieldRating::of(metrics.gross_yield_excl.min)
        ),
        format!(
            "Rentabilité brute TTC: {} ({:?})",
            format_percent_range(&metrics.gross_yield_incl),
            YieldRating::of(metrics.gross_yield_incl.min)
        ),
    ];
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Markdown tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkdownTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// First markdown table found in `content`, if any.
pub fn extract_markdown_table(content: &str) -> Option<MarkdownTable> {
    extract_markdown_tables(content).into_iter().next()
}

/// Every markdown table in `content`. Any line without a `|` (blank lines
/// included) ends the current table; separator rows (`|---|:--:|`) are dropped.
pub fn extract_markdown_tables(content: &str) -> Vec<MarkdownTable> {
    let mut tables = Vec::new();
    let mut current: Option<MarkdownTable> = None;

    for line in content.lines().map(str::trim) {
        if !line.contains('|') {
            if let Some(table) = current.take() {
                tables.push(table);
            }
            continue;
        }
        if is_separator_row(line) {
            continue;
        }

        let cells = split_cells(line);
        if cells.is_empty() {
            continue;
        }
        match current.as_mut() {
            Some(table) => table.rows.push(cells),
            None => {
                current = Some(MarkdownTable {
                    header: cells,
                    rows: Vec::new(),
                })
            }
        }
    }

    if let Some(table) = current {
        tables.push(table);
    }
    tables
}

fn split_cells(line: &str) -> Vec<String> {
    line.split('|')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_separator_row(line: &str) -> bool {
    line.contains('-')
        && line
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t'))
}
