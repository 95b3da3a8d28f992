use tau2gen::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(err) = cli::run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
    Ok(())
}
