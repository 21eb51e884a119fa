use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use slipwire::blocking::Client;
use slipwire::{ClientConfig, Engine, EngineConfig};
use tracing::info;

pub fn fetch(
    url: &str,
    method: &str,
    headers: &[String],
    data: Option<&str>,
    timeout_secs: f64,
    no_redirects: bool,
    json_out: bool,
) -> anyhow::Result<()> {
    if !timeout_secs.is_finite() || timeout_secs <= 0.0 {
        anyhow::bail!("--timeout must be a positive number of seconds, got {timeout_secs}");
    }
    let timeout = Duration::try_from_secs_f64(timeout_secs)
        .with_context(|| format!("--timeout {timeout_secs} is out of range"))?;

    let engine = Engine::new(EngineConfig::default()).context(
        "cronet engine unavailable (build with --features link-cronet and set CRONET_DIR)",
    )?;
    let client = Client::with_config(
        Arc::new(engine),
        ClientConfig::default().with_timeout(timeout),
    );

    let mut request = client.request(method, url);
    for header in headers {
        let (name, value) = header
            .split_once(':')
            .with_context(|| format!("malformed header {header:?}, expected \"Name: value\""))?;
        request = request.header(name.trim(), value.trim());
    }
    if let Some(data) = data {
        request = request.body(data.as_bytes().to_vec());
    }
    if no_redirects {
        request = request.allow_redirects(false);
    }

    let started = Instant::now();
    let Some(response) = request.send()? else {
        anyhow::bail!("request was cancelled by the engine");
    };
    info!(
        status = response.status(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "fetch finished"
    );

    println!("{} {}", response.status(), response.url());
    for (name, value) in response.headers().iter() {
        println!("{name}: {value}");
    }
    println!();
    if json_out {
        let value: serde_json::Value =
            response.json().context("response body is not valid JSON")?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        match response.text() {
            Ok(text) => println!("{text}"),
            Err(_) => println!("({} bytes of non-text data)", response.body().len()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_timeouts_are_rejected() {
        let err = fetch("http://test.local/x", "GET", &[], None, -5.0, false, false)
            .expect_err("a negative timeout must not pass validation");
        assert!(err.to_string().contains("--timeout"), "got: {err}");
    }

    #[test]
    fn non_finite_timeouts_are_rejected() {
        for bad in [f64::NAN, f64::INFINITY] {
            let err = fetch("http://test.local/x", "GET", &[], None, bad, false, false)
                .expect_err("a non-finite timeout must not pass validation");
            assert!(err.to_string().contains("--timeout"), "got: {err}");
        }
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let err = fetch("http://test.local/x", "GET", &[], None, 0.0, false, false)
            .expect_err("a zero timeout must not pass validation");
        assert!(err.to_string().contains("--timeout"), "got: {err}");
    }
}
