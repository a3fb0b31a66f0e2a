#[rocket::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    if let Err(e) = agentforge::rocket().launch().await {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}
