use clap::Parser;

#[tokio::main]
async fn main() {
    fundcast::api::init_tracing();
    let cli = fundcast::api::Cli::parse();
    if let Err(e) = fundcast::api::run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
