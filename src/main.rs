//! SAN Finance Backend - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() {
    if let Err(e) = san_finance_backend::run().await {
        tracing::error!("Server failed: {}", e);
        eprintln!("Server failed: {}", e);
        std::process::exit(1);
    }
}
