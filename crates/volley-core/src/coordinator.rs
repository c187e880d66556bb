//! `BatchCoordinator`: validates a caller request, runs the engine once and
//! assembles the answer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::credential::{CredentialSet, CredentialSource};
use crate::decoder::{ProfileRecord, ProtobufProfileDecoder, ResponseDecoder};
use crate::engine::{BatchResult, DispatchEngine, EngineConfig};
use crate::error::DispatchError;
use crate::executor::RequestExecutor;
use crate::payload::{PayloadEncoder, ProtobufIdEncoder};
use crate::region::{Region, RegionClass, DEFAULT_REGION_CODE};

/// Raw, unvalidated request parameters as they arrive from a caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchParams {
    pub id: Option<String>,
    pub region: Option<String>,
    pub target: Option<String>,
    pub concurrency: Option<String>,
}

/// Values used for parameters the caller left out.
#[derive(Debug, Clone)]
pub struct RequestDefaults {
    pub region: String,
    pub target: u64,
    pub concurrency: u64,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION_CODE.to_string(),
            target: 1_000,
            concurrency: 500,
        }
    }
}

/// A validated batch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub target_id: u64,
    pub region: Region,
    pub target_success_count: u64,
    pub requested_concurrency: u64,
}

fn invalid_field(name: &str, err: impl std::fmt::Display) -> DispatchError {
    DispatchError::InvalidInput {
        message: "Invalid parameters".to_string(),
        detail: Some(format!("{name}: {err}")),
    }
}

/// Wide enough for every `u64` and for negative input.
fn parse_field(name: &str, raw: Option<&str>, default: u64) -> Result<i128, DispatchError> {
    match raw {
        None => Ok(i128::from(default)),
        Some(s) => s.trim().parse::<i128>().map_err(|e| invalid_field(name, e)),
    }
}

fn narrow(name: &str, value: i128) -> Result<u64, DispatchError> {
    u64::try_from(value).map_err(|e| invalid_field(name, e))
}

impl BatchParams {
    /// Validate into a [`BatchRequest`], filling gaps from `defaults`.
    pub fn validate(&self, defaults: &RequestDefaults) -> Result<BatchRequest, DispatchError> {
        let id = parse_field("id", self.id.as_deref(), 0)?;
        let target = parse_field("target", self.target.as_deref(), defaults.target)?;
        let concurrency = parse_field(
            "concurrency",
            self.concurrency.as_deref(),
            defaults.concurrency,
        )?;

        if id <= 0 || target <= 0 {
            return Err(DispatchError::invalid(
                "id and target must be positive integers",
            ));
        }
        if concurrency <= 0 {
            return Err(DispatchError::invalid(
                "concurrency must be a positive integer",
            ));
        }

        let region = Region::parse(self.region.as_deref().unwrap_or(&defaults.region));

        Ok(BatchRequest {
            target_id: narrow("id", id)?,
            region,
            target_success_count: narrow("target", target)?,
            requested_concurrency: narrow("concurrency", concurrency)?,
        })
    }
}

/// Answer for a batch whose first payload decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    #[serde(flatten)]
    pub profile: ProfileRecord,
    pub remaining: u64,
    pub success: u64,
    pub total_attempts: u64,
    pub elapsed_seconds: f64,
}

/// One executor per routing class.
#[derive(Clone)]
pub struct RouteTable {
    pub india: Arc<dyn RequestExecutor>,
    pub americas: Arc<dyn RequestExecutor>,
    pub global: Arc<dyn RequestExecutor>,
}

impl RouteTable {
    /// Route every class to the same executor.
    pub fn uniform(executor: Arc<dyn RequestExecutor>) -> Self {
        Self {
            india: executor.clone(),
            americas: executor.clone(),
            global: executor,
        }
    }

    pub fn get(&self, class: RegionClass) -> &Arc<dyn RequestExecutor> {
        match class {
            RegionClass::India => &self.india,
            RegionClass::Americas => &self.americas,
            RegionClass::Global => &self.global,
        }
    }
}

/// Coordinator settings.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub defaults: RequestDefaults,
    /// Hard cap on worker concurrency regardless of what the caller asks for.
    pub concurrency_ceiling: u64,
    pub engine: EngineConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            defaults: RequestDefaults::default(),
            concurrency_ceiling: 5_000,
            engine: EngineConfig::default(),
        }
    }
}

/// Thin glue between a caller and the [`DispatchEngine`].
pub struct BatchCoordinator {
    routes: RouteTable,
    credentials: Arc<dyn CredentialSource>,
    encoder: Arc<dyn PayloadEncoder>,
    decoder: Arc<dyn ResponseDecoder>,
    config: CoordinatorConfig,
}

impl BatchCoordinator {
    pub fn new(
        routes: RouteTable,
        credentials: Arc<dyn CredentialSource>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            routes,
            credentials,
            encoder: Arc::new(ProtobufIdEncoder),
            decoder: Arc::new(ProtobufProfileDecoder),
            config,
        }
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn PayloadEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn ResponseDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Concurrency actually handed to the engine.
    pub fn clamp_concurrency(&self, requested: u64) -> u64 {
        requested.clamp(1, self.config.concurrency_ceiling.max(1))
    }

    /// Validate raw parameters and run the batch.
    pub async fn dispatch(&self, params: &BatchParams) -> Result<BatchReport, DispatchError> {
        let request = params.validate(&self.config.defaults)?;
        self.run(request).await
    }

    /// Run a validated request.
    #[tracing::instrument(
        skip(self, request),
        fields(id = request.target_id, region = %request.region)
    )]
    pub async fn run(&self, request: BatchRequest) -> Result<BatchReport, DispatchError> {
        let class = request.region.class();
        let credentials = self.load_credentials(class).await;
        if credentials.is_empty() {
            return Err(DispatchError::NoCredentials {
                scope: format!("region {}", request.region.code()),
            });
        }

        let concurrency = self.clamp_concurrency(request.requested_concurrency);
        let executor = self.routes.get(class).clone();

        tracing::info!(
            target_success = request.target_success_count,
            credentials = credentials.len(),
            concurrency,
            endpoint = %executor.endpoint(),
            "dispatching batch"
        );

        let payload = self.encoder.encode(request.target_id);
        let engine = DispatchEngine::new(executor, self.config.engine.clone());
        let result = engine
            .run_batch(
                credentials,
                payload,
                request.target_success_count,
                concurrency,
            )
            .await?;

        self.assemble(&request, result)
    }

    async fn load_credentials(&self, class: RegionClass) -> CredentialSet {
        match self.credentials.load(class).await {
            Ok(set) => set,
            Err(e) => {
                tracing::error!(class = %class, error = %e, "credential load failed");
                CredentialSet::default()
            }
        }
    }

    fn assemble(
        &self,
        request: &BatchRequest,
        result: BatchResult,
    ) -> Result<BatchReport, DispatchError> {
        let elapsed_seconds = result.elapsed_secs_rounded();
        let undecoded = || DispatchError::Undecoded {
            success: result.success_count,
            attempts: result.attempt_count,
            elapsed_seconds,
        };

        let Some(payload) = result.first_success_payload.as_ref() else {
            return Err(undecoded());
        };
        let profile = self.decoder.decode(payload).map_err(|e| {
            tracing::error!(error = %e, "failed to decode captured response");
            undecoded()
        })?;

        Ok(BatchReport {
            profile,
            remaining: result.remaining(request.target_success_count),
            success: result.success_count,
            total_attempts: result.attempt_count,
            elapsed_seconds,
        })
    }
}
