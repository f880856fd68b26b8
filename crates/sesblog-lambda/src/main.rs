// AWS Lambda binary entry point
//
// Build with: cargo build -p sesblog-lambda --release
// The binary is named `bootstrap` for the provided.al2023 runtime.

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    sesblog_lambda::run().await
}
