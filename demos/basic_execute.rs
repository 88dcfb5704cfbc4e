//! Basic example demonstrating GET and POST requests through an executor.
//!
//! This example shows how to:
//! - Configure an executor's timeout and retry budget
//! - Execute a GET request and decode the JSON body
//! - Execute a POST request with a JSON payload
//! - Inspect how many attempts a call took
//!
//! Run with: `cargo run --example basic_execute`

use serde::{Deserialize, Serialize};
use std::time::Duration;
use steadycall::{Error, Executor, HttpRequest};

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("steadycall=debug,basic_execute=info")
        .init();

    let executor = Executor::builder()
        .timeout(Duration::from_secs(5))
        .retry(2)
        .retry_wait(Duration::from_millis(500))
        .build()?;

    println!("=== GET Request Example ===");
    let request = HttpRequest::get("https://jsonplaceholder.typicode.com/posts/1")?;
    let response = executor.execute(None, request).await?;

    println!("Status code: {}", response.status());
    println!("Attempts: {}", response.attempts());
    println!("Request latency: {:?}", response.latency());
    let post: Post = response.json().await?;
    println!("Post ID: {}", post.id);
    println!("Title: {}", post.title);
    println!();

    println!("=== POST Request Example ===");
    let new_post = NewPost {
        title: "My New Post".to_string(),
        body: "This is the content of my new post!".to_string(),
        user_id: 1,
    };
    let request = HttpRequest::post("https://jsonplaceholder.typicode.com/posts")?
        .with_json(&new_post)?;
    let response = executor.execute(None, request).await?;

    println!("Status code: {}", response.status());
    println!("Content-Type: {:?}", response.header("content-type"));
    println!("Was retried: {}", response.was_retried());
    println!();

    println!("=== Rejected Request Example ===");
    let request = HttpRequest::get("https://jsonplaceholder.typicode.com/does-not-exist")?;
    match executor.execute(None, request).await {
        Err(Error::Status { status, body, .. }) => {
            println!("Server answered {} (body: {:?})", status, body);
        }
        other => println!("Unexpected outcome: {:?}", other.map(|r| r.status())),
    }

    Ok(())
}
