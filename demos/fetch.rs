use resilient_http::{RequestSpec, RetryExecutor, RetryOptions};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://httpbin.org/status/503".to_owned());
    let options = RetryOptions::from_env().map_err(anyhow::Error::msg)?;

    let spec = RequestSpec::get(url)
        .try_header("accept", "application/json")?
        .with_options(options);

    match RetryExecutor::new().execute_with_retry(&spec).await {
        Ok(response) => {
            println!("{} ({} bytes)", response.status(), response.body().len());
            println!("{}", response.text());
        }
        Err(err) => {
            eprintln!("request failed: {err}");
            if let Some(attempts) = err.attempts() {
                eprintln!("attempts made: {attempts}");
            }
        }
    }

    Ok(())
}
