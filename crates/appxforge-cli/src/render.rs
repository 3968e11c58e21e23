use std::io::IsTerminal;
use std::time::Duration;

use anstyle::{AnsiColor, Style};
use appxforge_core::PackageEntity;
use indicatif::{ProgressBar, ProgressStyle};

// log lines emitted by a full run vs. one stopped after the archive step
const FULL_RUN_STEPS: u64 = 9;
const SKIP_SIGN_STEPS: u64 = 3;

pub fn is_interactive() -> bool {
    std::io::stderr().is_terminal()
}

pub fn status_line(succeeded: bool, message: &str) -> String {
    let (status, color) = if succeeded {
        ("ok", AnsiColor::Green)
    } else {
        ("failed", AnsiColor::Red)
    };
    let style = Style::new().bold().fg_color(Some(color.into()));
    format!("{style}{status}{style:#} {message}")
}

pub fn format_package_table(entities: &[PackageEntity]) -> Vec<String> {
    let name_width = column_width(entities.iter().map(|e| e.display_name.as_str()), "NAME");
    let version_width = column_width(entities.iter().map(|e| e.version.as_str()), "VERSION");
    let arch_width = column_width(entities.iter().map(|e| e.architecture.as_str()), "ARCH");

    let mut lines = vec![format!(
        "{:name_width$}  {:version_width$}  {:arch_width$}  PACKAGE FULL NAME",
        "NAME", "VERSION", "ARCH"
    )];
    for entity in entities {
        lines.push(format!(
            "{:name_width$}  {:version_width$}  {:arch_width$}  {}",
            entity.display_name,
            entity.version,
            entity.architecture.as_str(),
            entity.package_full_name,
        ));
    }
    lines
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values
        .map(str::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(header.len())
}

pub struct PackProgress {
    progress_bar: Option<ProgressBar>,
}

impl PackProgress {
    pub fn start(interactive: bool, skip_sign: bool) -> Self {
        let total = if skip_sign {
            SKIP_SIGN_STEPS
        } else {
            FULL_RUN_STEPS
        };
        let progress_bar = if interactive {
            let bar = ProgressBar::new(total);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.cyan.bold} [{bar:20.cyan/blue}] {pos:>2}/{len:2} {wide_msg}",
            ) {
                bar.set_style(style.progress_chars("=>-"));
            }
            bar.enable_steady_tick(Duration::from_millis(80));
            Some(bar)
        } else {
            None
        };
        Self { progress_bar }
    }

    pub fn step(&self, message: &str) {
        match &self.progress_bar {
            Some(bar) => {
                bar.println(message);
                bar.inc(1);
                bar.set_message(message.to_string());
            }
            None => println!("{message}"),
        }
    }

    pub fn finish(self) {
        if let Some(bar) = self.progress_bar {
            bar.finish_and_clear();
        }
    }
}
