use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::get_env_var;
use snafu::ResultExt;
use tracing::{debug, info};

use crate::{
    models::{
        date_range::DateRange,
        series::{Series, SeriesId},
    },
    providers::{
        ApiSnafu, ClientBuildSnafu, MissingEnvVarSnafu, ProviderError, ProviderInitError,
        ReqwestSnafu, SeriesProvider,
        fred_rest::{
            params::{FredParams, construct_params},
            response::{FredObservationsResponse, api_error_message, into_series},
        },
    },
};

pub const DEFAULT_BASE_URL: &str = "https://api.stlouisfed.org";
const OBSERVATIONS_PATH: &str = "/fred/series/observations";

/// Environment variable holding the FRED API key.
pub const API_KEY_ENV: &str = "FRED_API_KEY";

/// Connection settings for [`FredProvider`].
#[derive(Clone, Debug)]
pub struct FredOptions {
    pub base_url: String,
    pub timeout: Duration,
    pub params: FredParams,
}

impl Default for FredOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            params: FredParams::default(),
        }
    }
}

pub struct FredProvider {
    client: Client,
    observations_url: String,
    api_key: SecretString,
    params: FredParams,
}

impl FredProvider {
    /// Creates a FRED provider with default options.
    ///
    /// Reads the API key from the `FRED_API_KEY` environment variable.
    pub fn new() -> Result<Self, ProviderInitError> {
        Self::from_env(FredOptions::default())
    }

    /// Like [`FredProvider::new`] with explicit options.
    pub fn from_env(options: FredOptions) -> Result<Self, ProviderInitError> {
        let api_key = get_env_var(API_KEY_ENV).context(MissingEnvVarSnafu)?;
        Self::with_api_key(api_key, options)
    }

    pub fn with_api_key(
        api_key: impl Into<String>,
        options: FredOptions,
    ) -> Result<Self, ProviderInitError> {
        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            observations_url: format!(
                "{}{OBSERVATIONS_PATH}",
                options.base_url.trim_end_matches('/')
            ),
            api_key: SecretString::new(api_key.into().into_boxed_str()),
            params: options.params,
        })
    }

    pub fn observations_url(&self) -> &str {
        &self.observations_url
    }
}

#[async_trait]
impl SeriesProvider for FredProvider {
    async fn fetch_series(
        &self,
        id: &SeriesId,
        range: DateRange,
    ) -> Result<Series, ProviderError> {
        let mut observations = Vec::new();
        let mut offset = 0;

        loop {
            let mut query = construct_params(id, &range, &self.params, offset);
            query.push(("api_key", self.api_key.expose_secret().to_string()));

            // The request URL carries the API key; strip it from transport errors.
            let response = self
                .client
                .get(&self.observations_url)
                .query(&query)
                .send()
                .await
                .map_err(reqwest::Error::without_url)
                .context(ReqwestSnafu)?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return ApiSnafu {
                    status: status.as_u16(),
                    message: api_error_message(&body),
                }
                .fail();
            }

            let page = response
                .json::<FredObservationsResponse>()
                .await
                .map_err(reqwest::Error::without_url)
                .context(ReqwestSnafu)?;

            let received = page.observations.len();
            debug!(%id, offset, received, total = page.count, "received observations page");
            observations.extend(page.observations);
            offset += received;

            if received == 0 || offset >= page.count {
                break;
            }
        }

        info!(
            %id,
            start = %range.start(),
            end = %range.end(),
            observations = observations.len(),
            "fetched series from FRED"
        );
        into_series(id, observations, &range)
    }

    fn request_tag(&self) -> String {
        self.params.tag()
    }
}
