//! Console output for a reconciliation round
//!
//! One spinner per running build plus coloured result lines. Every event
//! is forwarded to [`TracingObserver`] as well.

use colored::Colorize;
use imagewright_core::{
    BuiltImage, CleanupOperation, Decision, Error, RoundObserver, RoundReport, TagOperation,
    TracingObserver,
};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {msg}";

pub struct ConsoleObserver {
    multi: MultiProgress,
    spinners: Mutex<HashMap<String, ProgressBar>>,
    tracing: TracingObserver,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            spinners: Mutex::new(HashMap::new()),
            tracing: TracingObserver,
        }
    }

    fn line(&self, message: String) {
        // 端末ではスピナーの上に出す。端末でなければ MultiProgress は何も表示しない
        if self.multi.is_hidden() || self.multi.println(&message).is_err() {
            println!("{}", message);
        }
    }

    fn start_spinner(&self, service: &str) {
        let spinner = self.multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_spinner().template(SPINNER_TEMPLATE) {
            spinner.set_style(style);
        }
        spinner.set_message(format!("Building {}...", service));
        spinner.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut spinners) = self.spinners.lock() {
            spinners.insert(service.to_string(), spinner);
        }
    }

    fn finish_spinner(&self, service: &str) {
        let spinner = self
            .spinners
            .lock()
            .ok()
            .and_then(|mut spinners| spinners.remove(service));
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
            self.multi.remove(&spinner);
        }
    }
}

impl RoundObserver for ConsoleObserver {
    fn invalid_service(&self, service: &str) {
        self.tracing.invalid_service(service);
        self.line(format!(
            "{} {} はビルドツールのプロジェクトではありません",
            "✗".red().bold(),
            service.yellow()
        ));
    }

    fn decision_made(&self, decision: &Decision) {
        self.tracing.decision_made(decision);
    }

    fn service_satisfied(&self, service: &str) {
        self.tracing.service_satisfied(service);
        self.line(format!(
            "{} {} {}",
            "✓".green(),
            service.cyan(),
            "(最新)".dimmed()
        ));
    }

    fn build_started(&self, service: &str) {
        self.tracing.build_started(service);
        self.start_spinner(service);
    }

    fn build_succeeded(&self, image: &BuiltImage) {
        self.tracing.build_succeeded(image);
        self.finish_spinner(&image.service);
        self.line(format!(
            "{} {} をビルドしました: {} {}",
            "✓".green().bold(),
            image.service.cyan(),
            image.source_ref(),
            format!("({})", image.strategy).dimmed()
        ));
    }

    fn build_failed(&self, service: &str, reason: &str) {
        self.tracing.build_failed(service, reason);
        self.finish_spinner(service);
        self.line(format!(
            "{} {} のビルドに失敗しました: {}",
            "✗".red().bold(),
            service.cyan(),
            reason
        ));
    }

    fn tag_applied(&self, operation: &TagOperation) {
        self.tracing.tag_applied(operation);
        self.line(format!(
            "  {} {} → {}",
            "🏷".normal(),
            operation.source_ref().dimmed(),
            operation.target_ref().green()
        ));
    }

    fn tag_failed(&self, operation: &TagOperation, error: &Error) {
        self.tracing.tag_failed(operation, error);
        self.line(format!(
            "  {} {} のタグ付けに失敗しました: {}",
            "✗".red(),
            operation.target_ref(),
            error
        ));
    }

    fn retag_abandoned(&self, service: &str, error: &Error) {
        self.tracing.retag_abandoned(service, error);
        self.line(format!("{} {}: {}", "✗".red(), service.cyan(), error));
    }

    fn cleanup_performed(&self, operation: &CleanupOperation) {
        self.tracing.cleanup_performed(operation);
        self.line(format!("  {} {}", "🗑".normal(), operation.to_string().dimmed()));
    }

    fn cleanup_failed(&self, operation: &CleanupOperation, error: &Error) {
        self.tracing.cleanup_failed(operation, error);
        self.line(format!(
            "  {} {} を削除できませんでした: {}",
            "⚠".yellow(),
            operation,
            error
        ));
    }

    fn round_finished(&self, report: &RoundReport) {
        self.tracing.round_finished(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imagewright_core::{BuildStrategy, BuiltImage};

    #[test]
    fn test_spinner_lifecycle() {
        let observer = ConsoleObserver::new();
        observer.build_started("orders");
        assert!(observer.spinners.lock().unwrap().contains_key("orders"));

        observer.build_succeeded(&BuiltImage {
            service: "orders".to_string(),
            repository: "orders".to_string(),
            source_tag: "latest".to_string(),
            strategy: BuildStrategy::Manual,
        });
        assert!(observer.spinners.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failed_build_clears_spinner() {
        let observer = ConsoleObserver::new();
        observer.build_started("orders");
        observer.build_failed("orders", "no strategy");
        assert!(observer.spinners.lock().unwrap().is_empty());
    }
}
