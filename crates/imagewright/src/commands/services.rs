use crate::app::{self, AppOptions};
use colored::Colorize;

pub async fn handle(options: &AppOptions) -> anyhow::Result<()> {
    let settings = options.load_settings()?;
    let adapter = app::connect_build_tool(options, &settings).await?;

    let services = adapter.services();
    println!(
        "{} {} 件のサービス ({})",
        "▶".blue(),
        services.len(),
        adapter.tool_name()
    );
    for service in services {
        println!("  {}", service.cyan());
    }
    Ok(())
}
