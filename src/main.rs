use anyhow::Result;
use tracing::info;

fn main() -> Result<()> {
    // Log to stderr; stdout belongs to the UCI protocol.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
    info!("sable starting");
    sable_uci::UciEngine::new().run()?;
    Ok(())
}
