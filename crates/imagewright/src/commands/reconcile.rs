use crate::RequestArgs;
use crate::app::{self, AppOptions};
use crate::observer::ConsoleObserver;
use crate::requests;
use colored::Colorize;
use imagewright_core::{FailureKind, Reconciler, RoundObserver, RoundReport, TracingObserver};

pub async fn handle(
    options: &AppOptions,
    args: &RequestArgs,
    jobs: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let requests = requests::collect(args)?;
    let settings = options.load_settings()?;

    let adapter = app::connect_build_tool(options, &settings).await?;
    let materializer = app::connect_docker(&settings).await?;
    let renderer = app::renderer(&settings)?;

    let console = ConsoleObserver::new();
    let tracing_only = TracingObserver;
    // JSON 出力時は stdout を汚さないようにログだけにする
    let observer: &dyn RoundObserver = if json { &tracing_only } else { &console };
    let reconciler = Reconciler::new(adapter.as_ref(), &materializer, &renderer)
        .with_options(app::engine_options(&settings, jobs))
        .with_observer(observer);

    if !json {
        println!(
            "{} {} 件の要求 ({})",
            "▶".blue(),
            requests.len(),
            adapter.tool_name()
        );
    }

    let report = reconciler.reconcile(&requests).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !report.is_success() {
        anyhow::bail!("{} 件のサービスで失敗しました", report.failures.len());
    }
    Ok(())
}

fn print_report(report: &RoundReport) {
    println!();
    for failure in &report.failures {
        let kind = match failure.kind {
            FailureKind::Resolution => "resolution".yellow(),
            FailureKind::Build => "build".red(),
            FailureKind::Registry => "registry".red(),
            FailureKind::Consistency => "consistency".magenta(),
        };
        println!(
            "{} {} [{}] {}",
            "✗".red().bold(),
            failure.service.cyan(),
            kind,
            failure.message
        );
    }
    for warning in &report.warnings {
        println!("{} {}", "⚠".yellow(), warning);
    }

    let summary = report.summary();
    let line = format!("{} ({} ms)", summary, report.duration_ms);
    if report.is_success() {
        println!("{} {}", "✓".green().bold(), line);
    } else {
        println!("{} {}", "✗".red().bold(), line);
    }
}
