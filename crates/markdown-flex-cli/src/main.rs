use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
    process,
};

use clap::{ArgGroup, Parser, Subcommand};
use markdown_flex::{
    ConvertOptions, FlexValidator, MarkdownFlexConverter, SizeMeter, ThemeName, ValidationReport,
};
use serde_json::{Value, json};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "markdown-flex")]
#[command(about = "Convert Markdown to LINE Flex Messages and validate Flex JSON", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a Markdown file into a Flex bubble or carousel.
    Convert {
        #[arg(short, long, value_name = "MARKDOWN")]
        file: PathBuf,
        #[arg(short, long, value_name = "JSON")]
        output: Option<PathBuf>,
        /// default or dark; falls back to MARKDOWN_FLEX_THEME.
        #[arg(short, long, value_parser = parse_theme)]
        theme: Option<ThemeName>,
        /// Request image rendering for code blocks.
        #[arg(short = 'c', long)]
        code_img: bool,
        #[arg(long, value_name = "OPTIONS_JSON")]
        options: Option<String>,
        /// Wrap the result in a complete flex message with alt text.
        #[arg(long)]
        flex: bool,
    },
    /// Validate Flex Message JSON from a file, an argument or stdin.
    #[command(group(ArgGroup::new("input").args(["file", "json"])))]
    Check {
        #[arg(short, long, value_name = "JSON_FILE")]
        file: Option<PathBuf>,
        #[arg(short, long, value_name = "JSON")]
        json: Option<String>,
        #[arg(short, long)]
        verbose: bool,
    },
}

fn parse_theme(value: &str) -> Result<ThemeName, String> {
    ThemeName::parse(value)
        .ok_or_else(|| format!("unknown theme {value:?} (expected default or dark)"))
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(()) => 0,
        Err(err) => {
            if !matches!(err, CliError::Validation { .. }) {
                eprintln!("error: {err}");
            }
            err.exit_code()
        }
    };
    process::exit(exit_code);
}

/// Diagnostics go to stderr so stdout carries only results.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Convert {
            file,
            output,
            theme,
            code_img,
            options,
            flex,
        } => handle_convert(ConvertParams {
            file,
            output,
            theme,
            code_img,
            options,
            flex,
        }),
        Command::Check {
            file,
            json,
            verbose,
        } => handle_check(file, json, verbose),
    }
}

struct ConvertParams {
    file: PathBuf,
    output: Option<PathBuf>,
    theme: Option<ThemeName>,
    code_img: bool,
    options: Option<String>,
    flex: bool,
}

fn handle_convert(params: ConvertParams) -> Result<(), CliError> {
    let markdown = fs::read_to_string(&params.file)
        .map_err(|err| CliError::InputRead(params.file.clone(), err.into()))?;
    debug!(path = %params.file.display(), bytes = markdown.len(), "markdown loaded");

    let mut options = match params.options.as_deref() {
        Some(raw) => {
            ConvertOptions::from_json_str(raw).map_err(|err| CliError::Options(err.into()))?
        }
        None => ConvertOptions::default(),
    };
    options.code_img |= params.code_img;
    let theme = params.theme.unwrap_or_else(ThemeName::from_env);

    let converter = MarkdownFlexConverter::new()
        .with_theme(theme.theme())
        .with_options(options);
    let output = converter.convert(&markdown);
    let document = if params.flex {
        output.into_message().unwrap_or_else(|| json!({}))
    } else {
        output.json
    };
    let rendered =
        serde_json::to_string_pretty(&document).map_err(|err| CliError::Encode(err.into()))?;

    match params.output {
        Some(path) => {
            fs::write(&path, format!("{rendered}\n"))
                .map_err(|err| CliError::OutputWrite(path.clone(), err.into()))?;
            println!("Output written to: {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn handle_check(
    file: Option<PathBuf>,
    json: Option<String>,
    verbose: bool,
) -> Result<(), CliError> {
    let raw = match (file, json) {
        (Some(path), _) => fs::read_to_string(&path)
            .map_err(|err| CliError::InputRead(path.clone(), err.into()))?,
        (None, Some(json)) => json,
        (None, None) => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|err| CliError::Stdin(err.into()))?;
            if buffer.trim().is_empty() {
                return Err(CliError::NoInput);
            }
            buffer
        }
    };
    let document: Value =
        serde_json::from_str(&raw).map_err(|err| CliError::InvalidJson(err.into()))?;

    let report = FlexValidator::new().validate(&document);
    if !report.is_valid() {
        println!("❌ Invalid Flex Message");
        println!();
        println!("Errors found:");
        for (index, violation) in report.violations.iter().enumerate() {
            println!("{:2}. {violation}", index + 1);
        }
        return Err(CliError::Validation { report });
    }

    println!("✅ Valid Flex Message");
    if verbose {
        print_details(&document);
    }
    Ok(())
}

fn print_details(document: &Value) {
    let kind = document["type"].as_str().unwrap_or("unknown");
    let alt_text_len = document["altText"].as_str().map_or(0, |t| t.chars().count());
    println!();
    println!("Message Details:");
    println!("- Type: {kind}");
    println!("- Alt Text Length: {alt_text_len} characters");
    let carousel = match kind {
        "flex" => {
            let contents = &document["contents"];
            let contents_kind = contents["type"].as_str().unwrap_or("unknown");
            println!("- Contents Type: {contents_kind}");
            (contents_kind == "carousel").then_some(contents)
        }
        "carousel" => Some(document),
        _ => None,
    };
    if let Some(carousel) = carousel {
        let count = carousel["contents"].as_array().map_or(0, Vec::len);
        println!("- Bubble Count: {count}");
    }
    println!("- Total Size: {} bytes", SizeMeter::new().json_size(document));
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {0}: {1}")]
    InputRead(PathBuf, #[source] anyhow::Error),
    #[error("failed to read stdin: {0}")]
    Stdin(#[source] anyhow::Error),
    #[error("no JSON data provided (use --file, --json or stdin)")]
    NoInput,
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] anyhow::Error),
    #[error("{0}")]
    Options(#[source] anyhow::Error),
    #[error("failed to encode output: {0}")]
    Encode(#[source] anyhow::Error),
    #[error("failed to write output file ({0}): {1}")]
    OutputWrite(PathBuf, #[source] anyhow::Error),
    #[error("validation failed with {} violation(s)", .report.len())]
    Validation { report: ValidationReport },
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::InputRead(_, _) => 1,
            CliError::Stdin(_) => 1,
            CliError::NoInput => 1,
            CliError::InvalidJson(_) => 1,
            CliError::Options(_) => 1,
            CliError::Encode(_) => 1,
            CliError::Validation { .. } => 2,
            CliError::OutputWrite(_, _) => 6,
        }
    }
}
