//! Cancelling calls with a deadline or an explicit trigger.
//!
//! The first call gets a deadline shorter than the server's delay and is
//! abandoned when it passes. The second call runs until Ctrl-C is pressed
//! or the server answers, whichever comes first.
//!
//! Run with: `cargo run --example cancellation`

use std::time::{Duration, Instant};
use steadycall::{CancelSignal, Error, Executor, HttpRequest};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("steadycall=debug,cancellation=info")
        .init();

    let executor = Executor::builder()
        .timeout(Duration::from_secs(3))
        .retry(3)
        .retry_wait(Duration::from_secs(1))
        .build()?;

    println!("=== Deadline Example ===");
    let signal = CancelSignal::with_timeout(Duration::from_millis(1500));
    let request = HttpRequest::get("https://httpbin.org/delay/5")?;

    let start = Instant::now();
    match executor.execute(Some(&signal), request).await {
        Err(Error::Canceled(reason)) => {
            println!("Gave up after {:?}: {}", start.elapsed(), reason);
        }
        other => println!("Unexpected outcome: {:?}", other.map(|r| r.status())),
    }
    println!();

    println!("=== Ctrl-C Example ===");
    println!("Press Ctrl-C to cancel the request");
    let signal = CancelSignal::new();
    let trigger = signal.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    let request = HttpRequest::get("https://httpbin.org/delay/10")?;
    match executor.execute(Some(&signal), request).await {
        Ok(response) => println!(
            "Answered {} after {} attempts",
            response.status(),
            response.attempts()
        ),
        Err(e) if e.is_canceled() => println!("Canceled: {}", e),
        Err(e) => println!("Failed: {}", e),
    }

    Ok(())
}
