//! Binary entrypoint for the Lenses CLI.

#[tokio::main]
async fn main() {
    let exit_code = lenses_cli::run().await;
    std::process::exit(exit_code);
}
