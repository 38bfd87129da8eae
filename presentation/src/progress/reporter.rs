//! Progress reporting for experiment runs

use colored::Colorize;
use conformity_application::ProgressNotifier;
use conformity_domain::{Model, Protocol};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Reports progress with one bar per protocol
pub struct ProgressReporter {
    multi: MultiProgress,
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bar: Mutex::new(None),
        }
    }

    fn protocol_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn failure_note(failures: usize) -> String {
        match failures {
            0 => "all items answered".green().to_string(),
            1 => "1 item failed".yellow().to_string(),
            n => format!("{} items failed", n).yellow().to_string(),
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_protocol_start(&self, protocol: Protocol, model: &Model, total_items: usize) {
        let pb = self.multi.add(ProgressBar::new(total_items as u64));
        pb.set_style(Self::protocol_style());
        pb.set_prefix(format!("{} / {}", model, protocol.display_name()));
        pb.set_message("Starting...");

        if let Ok(mut bar) = self.bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_item_complete(&self, _protocol: Protocol, id: &str, success: bool) {
        if let Ok(bar) = self.bar.lock()
            && let Some(pb) = bar.as_ref()
        {
            let status = if success {
                format!("{} {}", "v".green(), id)
            } else {
                format!("{} {}", "x".red(), id)
            };
            pb.set_message(status);
            pb.inc(1);
        }
    }

    fn on_protocol_complete(&self, protocol: Protocol, failures: usize) {
        if let Ok(mut bar) = self.bar.lock()
            && let Some(pb) = bar.take()
        {
            pb.finish_with_message(format!(
                "{} complete, {}",
                protocol.display_name().green(),
                Self::failure_note(failures)
            ));
        }
    }

    fn on_protocol_skipped(&self, protocol: Protocol, reason: &str) {
        let _ = self.multi.println(format!(
            "{} {} skipped: {}",
            "-".dimmed(),
            protocol.display_name().bold(),
            reason
        ));
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_protocol_start(&self, protocol: Protocol, model: &Model, total_items: usize) {
        println!(
            "{} {} on {} ({} items)",
            "->".cyan(),
            protocol.display_name().bold(),
            model,
            total_items
        );
    }

    fn on_item_complete(&self, _protocol: Protocol, id: &str, success: bool) {
        if !success {
            println!("  {} {} (failed)", "x".red(), id);
        }
    }

    fn on_protocol_complete(&self, _protocol: Protocol, failures: usize) {
        println!("  {}", ProgressReporter::failure_note(failures));
    }

    fn on_protocol_skipped(&self, protocol: Protocol, reason: &str) {
        println!("{} {} skipped: {}", "-".dimmed(), protocol.display_name(), reason);
    }
}
