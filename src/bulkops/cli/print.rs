use bulkops::api::{CmdMessage, MessageLevel};
use bulkops::model::{OperationResult, RecordRef};
use bulkops::store::UPDATED_AT_FIELD;
use chrono::{DateTime, Utc};
use colored::Colorize;
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const ID_WIDTH: usize = 24;
const TYPE_WIDTH: usize = 14;
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

pub(super) fn print_outcome_json(outcome: &OperationResult) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(())
}

pub(super) fn print_records(records: &[RecordRef]) {
    if records.is_empty() {
        println!("No documents found.");
        return;
    }

    for line in records.iter().map(record_line) {
        let RecordLine {
            id,
            doc_type,
            label,
            padding,
            age,
        } = line;
        println!(
            "{} {} {}{} {}",
            id.yellow(),
            doc_type.cyan(),
            label,
            padding,
            age.dimmed()
        );
    }
}

struct RecordLine {
    id: String,
    doc_type: String,
    label: String,
    padding: String,
    age: String,
}

fn record_line(record: &RecordRef) -> RecordLine {
    let id = pad_to_width(&truncate_to_width(&record.id, ID_WIDTH), ID_WIDTH);
    let doc_type = pad_to_width(&truncate_to_width(&record.doc_type, TYPE_WIDTH), TYPE_WIDTH);

    let available = LINE_WIDTH.saturating_sub(ID_WIDTH + TYPE_WIDTH + TIME_WIDTH + 3);
    let label = truncate_to_width(record.label().unwrap_or("(untitled)"), available);
    let padding = " ".repeat(available.saturating_sub(label.width()));

    let age = record
        .attributes
        .get(UPDATED_AT_FIELD)
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| format_time_ago(t.with_timezone(&Utc)))
        .unwrap_or_default();

    RecordLine {
        id,
        doc_type,
        label,
        padding,
        age: format!("{:>width$}", age, width = TIME_WIDTH),
    }
}

fn pad_to_width(s: &str, width: usize) -> String {
    format!("{}{}", s, " ".repeat(width.saturating_sub(s.width())))
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
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

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    Formatter::new().convert(duration.to_std().unwrap_or_default())
}
