use chrono::{Local, NaiveDateTime};
use colored::Colorize;
use inspectapp::commands::dashboard::Dashboard;
use inspectapp::commands::ncr::NcrDefaults;
use inspectapp::commands::{CmdMessage, InspectPaths, MessageLevel};
use inspectapp::config::InspectConfig;
use inspectapp::model::{Kind, Record, TIMESTAMP_FORMAT};
use serde_json::Value;
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const ID_WIDTH: usize = 6;
const TIME_WIDTH: usize = 16;

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

/// One line per record: id, summary, age.
pub(super) fn print_records<T: Record>(records: &[T]) {
    for record in records {
        let id = format!("{:>width$}. ", record.id(), width = ID_WIDTH - 2);
        let available = LINE_WIDTH.saturating_sub(ID_WIDTH + TIME_WIDTH);
        let summary = truncate_to_width(&record.summary(), available);
        let padding = available.saturating_sub(summary.width());
        println!(
            "{}{}{}{}",
            id.yellow(),
            summary,
            " ".repeat(padding),
            format_time_ago(&record.meta().created_at).dimmed()
        );
    }
}

/// All stored fields of one record, one `key: value` per line.
pub(super) fn print_record<T: Record>(record: &T) {
    let value = match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        _ => return,
    };
    let key_width = value.keys().map(|k| k.width()).max().unwrap_or(0);

    println!("{} #{}", T::LABEL.bold(), record.id());
    println!("--------------------------------");
    for (key, field) in &value {
        let text = match field {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        let pad = key_width.saturating_sub(key.width());
        println!("{}{}  {}", key.cyan(), " ".repeat(pad), text);
    }
}

pub(super) fn print_dashboard(dashboard: &Dashboard) {
    for kind in Kind::ALL {
        let label = kind.label();
        let pad = 24usize.saturating_sub(label.width());
        println!(
            "{}{}{:>6}",
            label,
            " ".repeat(pad),
            dashboard.total(kind).to_string().bold()
        );
    }
    println!(
        "{}",
        format!(
            "NCRs open: {}, closed: {}",
            dashboard.open_ncr, dashboard.closed_ncr
        )
        .dimmed()
    );
}

pub(super) fn print_ncr_defaults(defaults: &NcrDefaults) {
    println!("Contractor={}", defaults.contractor);
    println!(
        "technical_supervisor_company={}",
        defaults.technical_supervisor_company
    );
}

pub(super) fn print_config(config: &InspectConfig, paths: &InspectPaths) {
    println!("{} = {}", "ncr_prefix".cyan(), config.ncr_prefix);
    println!("{} = {}", "inspector_name".cyan(), config.inspector_name);
    println!("{} = {}", "data_dir".cyan(), paths.data_dir.display());
    println!("{} = {}", "uploads_dir".cyan(), paths.uploads_dir.display());
    println!("{} = {}", "export_dir".cyan(), paths.export_dir.display());
    let marker = if paths.config_file.exists() {
        ""
    } else {
        " (not present)"
    };
    println!(
        "{} = {}{}",
        "config_file".cyan(),
        paths.config_file.display(),
        marker.dimmed()
    );
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let c = if c == '\n' { ' ' } else { c };
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

fn format_time_ago(timestamp: &str) -> String {
    let Ok(created) = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT) else {
        return format!("{:>width$}", "", width = TIME_WIDTH);
    };
    let duration = Local::now().naive_local().signed_duration_since(created);
    let formatter = Formatter::new();
    let time_str = formatter.convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}
