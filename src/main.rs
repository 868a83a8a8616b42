use finance_backoffice::config::BackofficeConfig;
use finance_backoffice::error::BackofficeError;
use finance_backoffice::lifecycle::{setup_tracing, BackofficeSystem};
use serde_json::json;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), BackofficeError> {
    let config = BackofficeConfig::load()?;

    // Setup tracing once for the entire application
    setup_tracing(&config.log_filter);

    info!("Starting back office");

    let system = BackofficeSystem::new(config);
    if let Err(e) = system.start().await {
        error!(error = %e, "Startup failed");
        return Err(e);
    }

    for name in system.core().modules().list() {
        info!(module = %name, "Module registered");
    }
    for name in system.core().schemas().list() {
        if let Some(schema) = system.core().get_schema(&name) {
            info!(
                schema = %name,
                table = schema.table_name(),
                fields = schema.field_count(),
                "Schema registered"
            );
        }
    }

    // Run one lead through the record pipeline so the workflow wiring shows up in the logs
    let span = tracing::info_span!("lead_intake");
    let intake = async {
        let schemas = system.core().schemas();
        let lead = schemas
            .prepare_create(
                "leads",
                json!({
                    "name": "Sample Lead",
                    "company": "Example Ltd",
                    "email": "lead@example.com",
                    "phone": "0900-000-000",
                    "source": "推薦"
                }),
            )
            .await?;
        schemas.complete_create("leads", &lead).await?;
        Ok::<_, app_core::CoreError>(lead)
    }
    .instrument(span)
    .await;

    match intake {
        Ok(lead) => info!(score = %lead["lead_score"], "Sample lead processed"),
        Err(e) => error!(error = %e, "Sample lead rejected"),
    }

    // Shutdown system gracefully
    system.shutdown().await?;

    info!("Back office stopped");
    Ok(())
}
