//! CurlLabs backend: binary entrypoint.
//! Loads `.env`, initializes tracing and hands the Axum router to the runtime.

use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    curl_routine_tracker::init_tracing();

    let router = curl_routine_tracker::app().await?;
    Ok(router.into())
}
