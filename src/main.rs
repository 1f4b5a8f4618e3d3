use academia::academics::{academics_router, demo, Purpose};
use academia::config::AppConfig;
use academia::error::AppError;
use academia::telemetry;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "academia",
    about = "Student records service with a correlatividades eligibility engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run the eligibility engine against the seeded demo catalog
    Check(CheckArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug, Default)]
struct CheckArgs {
    /// Limit the check to one purpose (course or exam)
    #[arg(long)]
    purpose: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Check(args) => run_check(args),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let environment = demo::seeded()?;
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(academics_router(environment.service.clone()))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "academic records service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<(), AppError> {
    let environment = demo::seeded()?;
    let purposes: Vec<Purpose> = match args.purpose.as_deref() {
        Some("course") => vec![Purpose::Course],
        Some("exam") => vec![Purpose::Exam],
        _ => vec![Purpose::Course, Purpose::Exam],
    };

    println!(
        "Eligibility for student {} in plan {}",
        environment.student.0, environment.plan.0
    );

    let targets = [
        ("Didáctica de la Matemática", &environment.subject_didactics),
        ("Residencia Pedagógica", &environment.residency),
        ("Didáctica General", &environment.general_didactics),
        ("Pedagogía", &environment.pedagogy),
    ];
    for purpose in purposes {
        println!("-- purpose: {}", purpose.label());
        for (name, space) in &targets {
            let verdict = environment.service.eligibility(
                &environment.student,
                &environment.plan,
                space,
                purpose,
                None,
            )?;
            println!("   {name}: {}", verdict.decision.summary());
        }
    }

    let transcript = environment
        .service
        .transcript(&environment.student, &environment.plan)?;
    println!(
        "movements on record: {}, general average: {}",
        transcript.movements.len(),
        transcript
            .grade_average
            .map(|avg| format!("{avg:.2}"))
            .unwrap_or_else(|| "n/a".to_string())
    );

    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
