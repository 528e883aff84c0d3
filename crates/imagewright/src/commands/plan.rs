use crate::RequestArgs;
use crate::app::{self, AppOptions};
use crate::requests;
use colored::Colorize;
use imagewright_core::{PlannedRound, Reconciler};

pub async fn handle(options: &AppOptions, args: &RequestArgs, json: bool) -> anyhow::Result<()> {
    let requests = requests::collect(args)?;
    let settings = options.load_settings()?;

    let adapter = app::connect_build_tool(options, &settings).await?;
    let materializer = app::connect_docker(&settings).await?;
    let renderer = app::dry_run_renderer()?;

    let reconciler = Reconciler::new(adapter.as_ref(), &materializer, &renderer)
        .with_options(app::engine_options(&settings, None));
    let planned = reconciler.plan(&requests).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&planned)?);
    } else {
        print_plan(&planned, &settings.manual_source_tag);
    }
    Ok(())
}

fn print_plan(planned: &PlannedRound, manual_source_tag: &str) {
    for service in &planned.invalid {
        println!(
            "{} {} {}",
            "✗".red().bold(),
            service.yellow(),
            "(ビルドツールのプロジェクトではありません)".dimmed()
        );
    }
    for service in &planned.satisfied {
        println!("{} {} {}", "✓".green(), service.cyan(), "(最新)".dimmed());
    }
    for decision in &planned.decisions {
        let tags = decision
            .tags_to_create
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        if decision.must_build_new {
            println!(
                "{} {} ビルド → {}",
                "●".blue(),
                decision.service.cyan(),
                tags.green()
            );
        } else {
            println!(
                "{} {} 既存イメージにタグ付け → {}",
                "●".blue(),
                decision.service.cyan(),
                tags.green()
            );
        }
    }

    if planned.decisions.iter().any(|d| d.must_build_new) {
        println!(
            "{}",
            format!(
                "手動ビルドの場合、一時タグ '{}' を経由します",
                manual_source_tag
            )
            .dimmed()
        );
    }
    if planned.decisions.is_empty() && planned.invalid.is_empty() {
        println!("{}", "変更はありません".dimmed());
    }
}
