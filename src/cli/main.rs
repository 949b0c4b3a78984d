use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use image_meta::config::Config;
use image_meta::services::FixedPicker;
use image_meta::{Editor, MetadataEdit, MetadataField, SessionSnapshot, Status};

#[derive(Parser, Debug)]
#[command(
    name = "image-meta-cli",
    version,
    about = "Show and edit the title, description, keywords, author, and copyright of an image"
)]
struct Cli {
    /// Image file to open
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,

    /// New title
    #[arg(long)]
    title: Option<String>,

    /// New description
    #[arg(long)]
    description: Option<String>,

    /// New author
    #[arg(long)]
    author: Option<String>,

    /// New copyright notice
    #[arg(long)]
    copyright: Option<String>,

    /// New keywords, comma-separated ("sea, boats")
    #[arg(long)]
    keywords: Option<String>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Output the session as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Edits requested on the command line, in a fixed field order.
    fn edits(&self) -> Vec<MetadataEdit> {
        let fields = [
            (MetadataField::Title, &self.title),
            (MetadataField::Description, &self.description),
            (MetadataField::Author, &self.author),
            (MetadataField::Copyright, &self.copyright),
        ];
        let mut edits: Vec<MetadataEdit> = fields
            .into_iter()
            .filter_map(|(field, value)| {
                value
                    .as_ref()
                    .map(|v| MetadataEdit::Field(field, v.clone()))
            })
            .collect();
        if let Some(ref raw) = self.keywords {
            edits.push(MetadataEdit::Keywords(raw.clone()));
        }
        edits
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    let Some(ref path) = cli.path else {
        anyhow::bail!("No input image specified. Use --help for usage.");
    };

    let config = Config::load(cli.config.as_deref())?;
    let editor = Editor::builder()
        .config(&config)
        .picker(Arc::new(FixedPicker::new(path)))
        .build();

    editor.initialize().await;
    editor.open_image().await;

    let edits = cli.edits();
    if !edits.is_empty() {
        if editor.status() == Status::Success {
            for edit in edits {
                editor.apply(edit);
            }
            editor.save_metadata().await;
        } else {
            log::warn!("Not saving: the image could not be opened");
        }
    }

    let session = editor.snapshot();
    if cli.json {
        let out = serde_json::json!({
            "status_message": session.status_message(),
            "session": session,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_session(&session);
    }

    editor.teardown();
    if session.status == Status::Error {
        anyhow::bail!("{}", session.status_message());
    }
    Ok(())
}

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Max width for the value column before wrapping.
const VAL_WIDTH: usize = 46;
/// Indent for continuation lines (tag column width + " : " = 25 chars + 2 leading spaces).
const INDENT: &str = "                           ";

/// Print the session, organized by section.
fn print_session(session: &SessionSnapshot) {
    println!();
    if let Some(ref path) = session.image_path {
        println!("{BOLD}File:{RESET} {}", path.display());
    }
    println!("{DIM}{}{RESET}", "═".repeat(72));

    let metadata = &session.metadata;
    let keywords = session.keywords_text();
    let fields: Vec<(&str, &str)> = vec![
        ("Title", metadata.title.as_str()),
        ("Description", metadata.description.as_str()),
        ("Keywords", keywords.as_str()),
        ("Author", metadata.author.as_str()),
        ("Copyright", metadata.copyright.as_str()),
        ("DateTaken", metadata.date_taken.as_deref().unwrap_or("")),
    ];

    println!("  {BOLD}Metadata{RESET}");
    println!("  {DIM}{}{RESET}", "─".repeat(70));
    if fields.iter().all(|(_, v)| v.is_empty()) {
        println!("  {DIM}(no metadata found){RESET}");
    } else {
        for (tag, val) in &fields {
            if !val.is_empty() {
                print_row(tag, val);
            }
        }
    }
    println!();

    let info = &session.platform_info;
    if !info.os.is_empty() {
        print_row("Platform", &format!("{} {} ({})", info.os, info.arch, info.family));
    }
    let color = if session.status == Status::Error { RED } else { GREEN };
    println!("  {color}{:<22} : {}{RESET}", "Status", session.status_message());
    println!();
}

/// Print a single row in the metadata table.
fn print_row(tag: &str, val: &str) {
    let tag_col = format!("{:<22}", tag);
    let lines = wrap_text(val, VAL_WIDTH);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("  {tag_col} : {line}");
        } else {
            println!("  {INDENT}{line}");
        }
    }
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_from_flags() {
        let cli = Cli::parse_from([
            "image-meta-cli",
            "photo.jpg",
            "--copyright",
            "CC-BY",
            "--title",
            "Harbor",
            "--keywords",
            "sea, , boat",
        ]);
        assert_eq!(
            cli.edits(),
            vec![
                MetadataEdit::Field(MetadataField::Title, "Harbor".into()),
                MetadataEdit::Field(MetadataField::Copyright, "CC-BY".into()),
                MetadataEdit::Keywords("sea, , boat".into()),
            ]
        );
    }

    #[test]
    fn no_flags_no_edits() {
        let cli = Cli::parse_from(["image-meta-cli", "photo.jpg"]);
        assert!(cli.edits().is_empty());
        assert_eq!(cli.path, Some(PathBuf::from("photo.jpg")));
    }

    #[test]
    fn empty_value_is_still_an_edit() {
        let cli = Cli::parse_from(["image-meta-cli", "photo.jpg", "--author", ""]);
        assert_eq!(
            cli.edits(),
            vec![MetadataEdit::Field(MetadataField::Author, String::new())]
        );
    }

    #[test]
    fn wrap_long_values() {
        let lines = wrap_text("one two three four", 9);
        assert_eq!(lines, vec!["one two", "three", "four"]);
        assert_eq!(wrap_text("", 10), vec![""]);
    }
}
