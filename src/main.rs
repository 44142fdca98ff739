use std::process::ExitCode;

use anyhow::Context;
use feedbase_kernel::settings::Settings;

/// Container entrypoint: bootstrap the feed schema once and exit.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let settings = match Settings::load().with_context(|| "failed to load feedbase settings") {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("feedbase-app: {:#}", err);
            return ExitCode::from(feedbase_app::exit_code(&err));
        }
    };

    if let Err(err) = feedbase_telemetry::init(&settings.telemetry) {
        eprintln!("feedbase-app: {:#}", err);
        return ExitCode::FAILURE;
    }

    tracing::info!(
        env = ?settings.environment,
        db = %feedbase_db::redact_uri(&settings.database.uri),
        "feedbase-app bootstrap starting"
    );

    match feedbase_app::run_bootstrap(&settings).await {
        Ok(report) => {
            tracing::info!(
                database = %report.database,
                created = report.created_count(),
                "feedbase-app bootstrap complete"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(
                stage = ?err.reached_stage(),
                exit_code = err.exit_code(),
                error = %err.diagnostic(),
                "feedbase-app bootstrap failed"
            );
            ExitCode::from(err.exit_code())
        }
    }
}
