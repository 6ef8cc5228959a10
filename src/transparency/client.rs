//! HTTP client for the per-municipality benefit summaries.
//!
//! The API publishes monthly snapshots with a lag, so a query walks a short
//! sliding window: previous month first, then two more months back. An empty
//! JSON array means "no data for that month" and consumes one attempt; a
//! non-2xx status or an undecodable payload is a remote-service failure and
//! aborts the scan immediately. The two failure classes never mix.

use crate::models::{BenefitProgram, ExternalSummaryRecord, ReferenceMonth};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Public host of the transparency portal.
pub const DEFAULT_BASE_URL: &str = "https://api.portaldatransparencia.gov.br";

/// Months tried per query, most recent first.
pub const MONTH_WINDOW: usize = 3;

/// Request header carrying the API key.
const API_KEY_HEADER: &str = "chave-api-dados";

/// Failures while querying the transparency API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No API key configured; the external-summary feature is unavailable
    /// but the rest of the application keeps working.
    #[error("transparency API key not configured (set API_KEY)")]
    MissingApiKey,

    /// Non-2xx response. The raw status and body are surfaced so the user
    /// can judge whether the failure is transient.
    #[error("transparency API error {status}: {body}")]
    RemoteService { status: u16, body: String },

    #[error("failed to reach transparency API")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode transparency API response")]
    Decode(#[source] serde_json::Error),
}

/// One element of the API's JSON array response.
#[derive(Debug, Clone, Deserialize)]
struct MunicipalitySummaryPayload {
    #[serde(default)]
    valor: f64,
    #[serde(rename = "quantidadeBeneficiados", default)]
    quantidade_beneficiados: u64,
    #[serde(default)]
    municipio: MunicipioPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct MunicipioPayload {
    #[serde(rename = "nomeIBGE", default)]
    nome_ibge: Option<String>,
    #[serde(default)]
    uf: UfPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct UfPayload {
    #[serde(default)]
    sigla: Option<String>,
}

/// Client for the per-municipality summary endpoints.
pub struct TransparencyClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TransparencyClient {
    /// Build a client. `Err(MissingApiKey)` when no key is available, so the
    /// caller can degrade the feature instead of issuing doomed requests.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(FetchError::MissingApiKey)?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Transport)?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key,
        })
    }

    /// PBF summary for one municipality over the recent-month window.
    /// `Ok(None)` after three empty months.
    pub async fn fetch_family_benefit(
        &self,
        ibge_code: &str,
    ) -> Result<Option<ExternalSummaryRecord>, FetchError> {
        self.fetch_program(BenefitProgram::FamilyAllowance, ibge_code)
            .await
    }

    /// BPC summary for one municipality over the recent-month window.
    pub async fn fetch_continuous_benefit(
        &self,
        ibge_code: &str,
    ) -> Result<Option<ExternalSummaryRecord>, FetchError> {
        self.fetch_program(BenefitProgram::ContinuousPayment, ibge_code)
            .await
    }

    async fn fetch_program(
        &self,
        program: BenefitProgram,
        ibge_code: &str,
    ) -> Result<Option<ExternalSummaryRecord>, FetchError> {
        let months = recent_months(Utc::now().date_naive(), MONTH_WINDOW);
        info!(
            "Querying {} for municipality {} over {:?}",
            program,
            ibge_code,
            months.iter().map(|m| m.compact()).collect::<Vec<_>>()
        );

        let hit = scan_months(&months, |month| self.query(program, ibge_code, month)).await?;

        Ok(hit.map(|(payload, month)| ExternalSummaryRecord {
            municipality_name: payload
                .municipio
                .nome_ibge
                .unwrap_or_else(|| "N/A".to_string()),
            state_abbreviation: payload
                .municipio
                .uf
                .sigla
                .unwrap_or_else(|| "N/A".to_string()),
            total_value: payload.valor,
            beneficiary_count: payload.quantidade_beneficiados,
            reference_month: month,
        }))
    }

    /// One GET for one month. An empty array is a valid "no data" answer.
    async fn query(
        &self,
        program: BenefitProgram,
        ibge_code: &str,
        month: ReferenceMonth,
    ) -> Result<Vec<MunicipalitySummaryPayload>, FetchError> {
        let url = format!("{}{}", self.base_url, program.endpoint_path());
        debug!("GET {} mesAno={} codigoIbge={}", url, month.compact(), ibge_code);

        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "*/*")
            .query(&[
                ("mesAno", month.compact().as_str()),
                ("codigoIbge", ibge_code),
                ("pagina", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::RemoteService {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(FetchError::Decode)
    }
}

/// The `count` calendar months before `today`, most recent first.
fn recent_months(today: NaiveDate, count: usize) -> Vec<ReferenceMonth> {
    let mut months = Vec::with_capacity(count);
    let mut year = today.year();
    let mut month = today.month();
    for _ in 0..count {
        if month == 1 {
            month = 12;
            year -= 1;
        } else {
            month -= 1;
        }
        months.push(ReferenceMonth { year, month });
    }
    months
}

/// Walk the month window with a per-month fetch, returning the first
/// non-empty result. Errors from a fetch abort the scan; they never consume
/// a month attempt.
async fn scan_months<T, F, Fut>(
    months: &[ReferenceMonth],
    mut attempt: F,
) -> Result<Option<(T, ReferenceMonth)>, FetchError>
where
    F: FnMut(ReferenceMonth) -> Fut,
    Fut: Future<Output = Result<Vec<T>, FetchError>>,
{
    for &month in months {
        let mut rows = attempt(month).await?;
        if !rows.is_empty() {
            return Ok(Some((rows.remove(0), month)));
        }
        debug!("No records for {}", month);
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_recent_months_simple() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let months = recent_months(today, 3);
        assert_eq!(
            months,
            vec![
                ReferenceMonth { year: 2025, month: 5 },
                ReferenceMonth { year: 2025, month: 4 },
                ReferenceMonth { year: 2025, month: 3 },
            ]
        );
    }

    #[test]
    fn test_recent_months_crosses_year_boundary() {
        let today = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let months = recent_months(today, 3);
        assert_eq!(
            months,
            vec![
                ReferenceMonth { year: 2025, month: 1 },
                ReferenceMonth { year: 2024, month: 12 },
                ReferenceMonth { year: 2024, month: 11 },
            ]
        );
    }

    #[tokio::test]
    async fn test_scan_months_all_empty_makes_exactly_three_calls() {
        let months = recent_months(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), MONTH_WINDOW);
        let calls = RefCell::new(Vec::new());

        let result: Option<(u32, ReferenceMonth)> = scan_months(&months, |month| {
            calls.borrow_mut().push(month.compact());
            async { Ok(Vec::<u32>::new()) }
        })
        .await
        .unwrap();

        assert!(result.is_none());
        // One call per month, most recent first.
        assert_eq!(
            *calls.borrow(),
            vec!["202505", "202504", "202503"]
        );
    }

    #[tokio::test]
    async fn test_scan_months_stops_at_first_hit() {
        let months = recent_months(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), MONTH_WINDOW);
        let calls = RefCell::new(0usize);

        let result = scan_months(&months, |month| {
            *calls.borrow_mut() += 1;
            let hit = month.month == 4;
            async move { Ok(if hit { vec![42u32] } else { vec![] }) }
        })
        .await
        .unwrap();

        let (value, month) = result.unwrap();
        assert_eq!(value, 42);
        assert_eq!(month, ReferenceMonth { year: 2025, month: 4 });
        assert_eq!(*calls.borrow(), 2);
    }

    #[tokio::test]
    async fn test_scan_months_remote_error_aborts_immediately() {
        let months = recent_months(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), MONTH_WINDOW);
        let calls = RefCell::new(0usize);

        let result: Result<Option<(u32, ReferenceMonth)>, FetchError> =
            scan_months(&months, |_| {
                *calls.borrow_mut() += 1;
                async {
                    Err(FetchError::RemoteService {
                        status: 500,
                        body: "boom".to_string(),
                    })
                }
            })
            .await;

        assert!(matches!(
            result,
            Err(FetchError::RemoteService { status: 500, .. })
        ));
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_client_requires_api_key() {
        let missing = TransparencyClient::new(DEFAULT_BASE_URL, None, Duration::from_secs(8));
        assert!(matches!(missing, Err(FetchError::MissingApiKey)));

        let blank = TransparencyClient::new(
            DEFAULT_BASE_URL,
            Some("   ".to_string()),
            Duration::from_secs(8),
        );
        assert!(matches!(blank, Err(FetchError::MissingApiKey)));

        let ok = TransparencyClient::new(
            DEFAULT_BASE_URL,
            Some("key".to_string()),
            Duration::from_secs(8),
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_payload_decodes_with_missing_fields() {
        let body = r#"[{"valor": 1000.5, "quantidadeBeneficiados": 2,
                        "municipio": {"nomeIBGE": "Fátima", "uf": {"sigla": "BA"}}}]"#;
        let rows: Vec<MunicipalitySummaryPayload> = serde_json::from_str(body).unwrap();
        assert_eq!(rows[0].valor, 1000.5);
        assert_eq!(rows[0].quantidade_beneficiados, 2);
        assert_eq!(rows[0].municipio.nome_ibge.as_deref(), Some("Fátima"));

        // Sparse payloads fall back to defaults instead of failing.
        let sparse: Vec<MunicipalitySummaryPayload> = serde_json::from_str(r#"[{}]"#).unwrap();
        assert_eq!(sparse[0].valor, 0.0);
        assert!(sparse[0].municipio.uf.sigla.is_none());
    }
}
