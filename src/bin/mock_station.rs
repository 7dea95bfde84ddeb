//! Mock weather station HTTP server
//!
//! Simulates the Raspberry Pi station endpoint for local testing.
//!
//! Behavior:
//! 1. Listens on a configurable port (default 8000)
//! 2. GET /indexjson.php returns the series JSON:
//!    {"dateandtime":[...],"temperature":[...],"humidity":[...]}
//! 3. `hours` bounds the window (0 or absent means the whole backlog)
//! 4. `maxpts` decimates: every ceil(points/maxpts)-th reading is kept
//!
//! Readings are synthetic: a diurnal temperature/humidity curve sampled at
//! a fixed step over a rolling backlog.
//!
//! Usage:
//!   cargo run --bin mock-station -- --port 8000

use bytes::Bytes;
use clap::Parser;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const SECS_PER_DAY: f64 = 86_400.0;

#[derive(Parser, Debug)]
#[command(name = "mock-station")]
#[command(about = "Mock weather station endpoint for local testing")]
struct Args {
    /// TCP port to listen on
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Seconds between synthetic readings
    #[arg(long, default_value = "60")]
    step_secs: u32,

    /// Hours of backlog available to serve
    #[arg(long, default_value = "48")]
    backlog_hours: u32,
}

/// One synthetic reading
#[derive(Debug, Clone, Copy)]
struct Reading {
    timestamp: i64,
    temperature: f64,
    humidity: f64,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Diurnal curve: warm afternoons, damp nights
fn reading_at(timestamp: i64) -> Reading {
    let day_fraction = (timestamp.rem_euclid(86_400)) as f64 / SECS_PER_DAY;
    let phase = std::f64::consts::TAU * day_fraction;
    Reading {
        timestamp,
        temperature: round1(21.0 + 4.0 * (phase - std::f64::consts::FRAC_PI_2).sin()),
        humidity: round1(55.0 - 10.0 * (phase - std::f64::consts::FRAC_PI_2).sin()),
    }
}

/// Generate the requested window, oldest first
fn generate_series(now: i64, window_secs: i64, step_secs: i64) -> Vec<Reading> {
    let step = step_secs.max(1);
    let mut series = Vec::new();
    let mut t = now - window_secs;
    while t <= now {
        series.push(reading_at(t));
        t += step;
    }
    series
}

/// Keep every step-th reading, step = ceil(points / maxpts)
fn decimate(series: Vec<Reading>, maxpts: usize) -> Vec<Reading> {
    if maxpts == 0 || series.len() <= maxpts {
        return series;
    }
    let step = series.len().div_ceil(maxpts);
    series.into_iter().step_by(step).collect()
}

/// Pull an integer query parameter out of a raw query string
fn query_param(query: &str, key: &str) -> Option<i64> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .and_then(|(_, v)| v.parse().ok())
}

fn series_json(args: &Args, query: &str) -> String {
    let hours = query_param(query, "hours").unwrap_or(0);
    let maxpts = query_param(query, "maxpts").filter(|&v| v > 0).unwrap_or(2000) as usize;

    let backlog_secs = i64::from(args.backlog_hours) * 3600;
    let window_secs =
        if hours <= 0 { backlog_secs } else { hours.saturating_mul(3600).min(backlog_secs) };

    let now = chrono::Utc::now().timestamp();
    let series = decimate(
        generate_series(now, window_secs, i64::from(args.step_secs)),
        maxpts,
    );

    let timestamps: Vec<i64> = series.iter().map(|r| r.timestamp).collect();
    let temperatures: Vec<f64> = series.iter().map(|r| r.temperature).collect();
    let humidities: Vec<f64> = series.iter().map(|r| r.humidity).collect();

    serde_json::json!({
        "dateandtime": timestamps,
        "temperature": temperatures,
        "humidity": humidities,
    })
    .to_string()
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    args: Arc<Args>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/indexjson.php") => {
            let query = req.uri().query().unwrap_or("");
            let body = series_json(&args, query);
            info!(query = %query, bytes = body.len(), "series_served");
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from(body)))
                .expect("static response should not fail"))
        }
        (&Method::GET, "/health") => Ok(Response::builder()
            .status(StatusCode::OK)
            .body(Full::new(Bytes::from("ok")))
            .expect("static response should not fail")),
        _ => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("Not Found")))
            .expect("static response should not fail")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let args = Arc::new(Args::parse());
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = TcpListener::bind(addr).await?;

    info!(port = args.port, step_secs = args.step_secs, backlog_hours = args.backlog_hours, "mock_station_started");

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _addr)) => {
                        let io = TokioIo::new(stream);
                        let args = args.clone();

                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                let args = args.clone();
                                async move { handle_request(req, args).await }
                            });

                            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                                error!(error = %e, "mock_station_http_error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "mock_station_accept_error");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("mock_station_shutdown");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimate_keeps_all_under_limit() {
        let series = generate_series(10_000, 600, 60);
        let n = series.len();
        assert_eq!(decimate(series, 2000).len(), n);
    }

    #[test]
    fn test_decimate_steps_over_limit() {
        let series = generate_series(100_000, 99 * 60, 60); // 100 readings
        let sampled = decimate(series, 40);
        // step = ceil(100/40) = 3 -> indices 0,3,..,99 -> 34 readings
        assert_eq!(sampled.len(), 34);
    }

    #[test]
    fn test_query_param() {
        assert_eq!(query_param("hours=24&maxpts=2000", "hours"), Some(24));
        assert_eq!(query_param("hours=24&maxpts=2000", "maxpts"), Some(2000));
        assert_eq!(query_param("hours=24", "maxpts"), None);
        assert_eq!(query_param("", "hours"), None);
        assert_eq!(query_param("hours=abc", "hours"), None);
    }

    #[test]
    fn test_series_json_is_parseable_and_correlated() {
        let args = Args { port: 0, step_secs: 60, backlog_hours: 1 };
        let body = series_json(&args, "hours=1&maxpts=2000");
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        let n = value["dateandtime"].as_array().unwrap().len();
        assert!(n > 0);
        assert_eq!(value["temperature"].as_array().unwrap().len(), n);
        assert_eq!(value["humidity"].as_array().unwrap().len(), n);
    }
}
