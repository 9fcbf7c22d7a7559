use toolcall::providers::LmStudio;
use toolcall::receipt::ReceiptTool;
use toolcall::tools::ToolRegistry;
use toolcall::Orchestrator;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=toolcall=debug shows request bodies and the generated receipt.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // LMSTUDIO_BASE_URL, LMSTUDIO_MODEL, ... override the local defaults.
    let client = LmStudio::from_env()?;
    let tools = ToolRegistry::new().register(ReceiptTool)?;

    let outcome = Orchestrator::new(client, tools)
        .run("Please give me a receipt for order number 1017.")
        .await?;

    if let Some(receipt) = &outcome.tool_result {
        println!("generate_receipt returned:\n{}\n", serde_json::to_string_pretty(receipt)?);
    }
    println!("Final model response:\n\n{}", outcome.answer);

    Ok(())
}
