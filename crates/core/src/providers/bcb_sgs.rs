use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use super::traits::InflationProvider;
use crate::errors::CoreError;
use crate::models::inflation::InflationPoint;

const PROVIDER: &str = "BCB SGS";

/// Banco Central do Brasil time series (SGS) provider.
///
/// - **Free**: No API key, public endpoint.
/// - **Default series**: 433, IPCA monthly variation in percent.
/// - **Endpoint**: `/bcdata.sgs.{code}/dados?formato=json&dataInicial=dd/MM/yyyy&dataFinal=dd/MM/yyyy`
///
/// Values arrive as strings (`"0.42"`), dated on the first day of the month.
pub struct BcbSgsProvider {
    client: Client,
    base_url: String,
    series: u32,
}

impl BcbSgsProvider {
    pub fn new(base_url: impl Into<String>, series: u32, timeout_secs: u64) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(timeout_secs));
        #[cfg(target_arch = "wasm32")]
        let _ = timeout_secs;
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            series,
        }
    }
}

// ── SGS response types ──────────────────────────────────────────────

#[derive(Deserialize)]
struct SgsRow {
    data: String,
    valor: String,
}

/// Parse SGS rows, skipping any with an unreadable date or value.
fn parse_rows(rows: &[SgsRow]) -> Vec<InflationPoint> {
    let mut points: Vec<InflationPoint> = rows
        .iter()
        .filter_map(|row| {
            let date = NaiveDate::parse_from_str(row.data.trim(), "%d/%m/%Y").ok()?;
            let rate_pct = row.valor.trim().replace(',', ".").parse::<f64>().ok()?;
            rate_pct.is_finite().then_some(InflationPoint { date, rate_pct })
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl InflationProvider for BcbSgsProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_monthly_rates(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<InflationPoint>, CoreError> {
        let url = format!(
            "{}/bcdata.sgs.{}/dados?formato=json&dataInicial={}&dataFinal={}",
            self.base_url,
            self.series,
            from.format("%d/%m/%Y"),
            to.format("%d/%m/%Y"),
        );

        let rows: Vec<SgsRow> = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to parse series {}: {e}", self.series),
            })?;

        Ok(parse_rows(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_skips_garbage() {
        let json = r#"[
            {"data": "01/02/2020", "valor": "0.25"},
            {"data": "01/01/2020", "valor": "0.21"},
            {"data": "not a date", "valor": "0.30"},
            {"data": "01/03/2020", "valor": "n/a"},
            {"data": "01/04/2020", "valor": "-0,31"}
        ]"#;
        let rows: Vec<SgsRow> = serde_json::from_str(json).unwrap();
        let points = parse_rows(&rows);

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(points[0].rate_pct, 0.21);
        assert_eq!(points[2].rate_pct, -0.31);
    }
}
