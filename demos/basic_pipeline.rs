//! A complete example showing how to build a request pipeline with Strata.
//!
//! This example demonstrates:
//! - Writing stages with an up phase and a down phase
//! - Short-circuiting from inside a stage
//! - Branching with a `Filter` that only runs for admin requests
//! - How a matched branch wraps the rest of the enclosing pipeline

use strata::prelude::*;

// ============================================================================
// Request / Response
// ============================================================================

#[derive(Debug, Clone, Default)]
struct Exchange {
    path: String,
    user: Option<String>,
    body: Option<String>,
    headers: Vec<String>,
}

impl Exchange {
    fn request(path: &str, user: Option<&str>) -> Self {
        Exchange {
            path: path.to_string(),
            user: user.map(str::to_string),
            ..Default::default()
        }
    }
}

// ============================================================================
// Step 1: Timing stage (wraps everything)
// ============================================================================

struct Timing;

#[async_trait]
impl Stage<Exchange> for Timing {
    async fn invoke(&self, input: Exchange, next: Next<'_, Exchange>) -> Result<Exchange> {
        let started = std::time::Instant::now();
        let mut output = next.run(input).await?;
        output
            .headers
            .push(format!("x-elapsed-us: {}", started.elapsed().as_micros()));
        Ok(output)
    }
}

// ============================================================================
// Step 2: Admin-only stages (inside the filter)
// ============================================================================

/// Rejects admin requests without a user.
struct RequireUser;

#[async_trait]
impl Stage<Exchange> for RequireUser {
    async fn invoke(&self, input: Exchange, next: Next<'_, Exchange>) -> Result<Exchange> {
        match input.user {
            Some(_) => next.run(input).await,
            None => Err(PipelineError::reject(format!(
                "{} requires an authenticated user",
                input.path
            ))),
        }
    }
}

/// Marks the response once the handler has produced it.
struct AuditTrail;

#[async_trait]
impl Stage<Exchange> for AuditTrail {
    async fn invoke(&self, input: Exchange, next: Next<'_, Exchange>) -> Result<Exchange> {
        let user = input.user.clone().unwrap_or_default();
        let mut output = next.run(input).await?;
        output.headers.push(format!("x-audited-for: {}", user));
        Ok(output)
    }
}

// ============================================================================
// Step 3: Handler (end of the chain)
// ============================================================================

struct Handler;

#[async_trait]
impl Stage<Exchange> for Handler {
    async fn invoke(&self, mut input: Exchange, _next: Next<'_, Exchange>) -> Result<Exchange> {
        input.body = Some(format!("served {}", input.path));
        Ok(input)
    }
}

// ============================================================================
// Main: Build and run the pipeline
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() {
    println!("=== Strata Basic Pipeline Example ===\n");

    let pipeline = Pipeline::named("http")
        .pipe(Timing)
        .pipe(
            Filter::when(|req: &Exchange| req.path.starts_with("/admin"))
                .named("admin")
                .pipe(RequireUser)
                .pipe(AuditTrail),
        )
        .pipe(Handler);

    let requests = vec![
        Exchange::request("/home", None),
        Exchange::request("/admin/users", Some("alice")),
        Exchange::request("/admin/users", None),
    ];

    for request in requests {
        let path = request.path.clone();
        match pipeline.run(request).await {
            Ok(response) => {
                println!("{} -> {}", path, response.body.unwrap_or_default());
                for header in response.headers {
                    println!("    {}", header);
                }
            }
            Err(err) => println!("{} -> error: {}", path, err),
        }
    }

    println!("\n=== Pipeline Complete ===");
}
