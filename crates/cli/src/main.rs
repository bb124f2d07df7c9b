use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use anyhow::{Context, bail};
use clap::Parser;
use harvest_core::{
    Document, ExtractionOptions, ExtractionRequest, FetchConfig, MissingScope, OutputFormat, extract_with_report,
    fetch_file, fetch_stdin, fetch_url,
};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use url::Url;

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Location used for file and stdin input when none is given.
const DEFAULT_LOCATION: &str = "http://localhost/";

/// Output format for the extraction result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Format(OutputFormat);

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self(OutputFormat::Json)),
            "text" | "txt" => Ok(Self(OutputFormat::PlainText)),
            "links" => Ok(Self(OutputFormat::Links)),
            _ => Err(format!("Invalid format: {}. Valid options: json, text, links", s)),
        }
    }
}

/// An iframe document given on the command line as `SRC=FILE[@LOCATION]`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FrameSpec {
    src: String,
    file: String,
    location: Option<String>,
}

impl FromStr for FrameSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (src, rest) = s
            .split_once('=')
            .ok_or_else(|| format!("Invalid frame: {}. Expected SRC=FILE[@LOCATION]", s))?;

        let (file, location) = match rest.rsplit_once('@') {
            Some((file, location)) if location.contains("://") => (file, Some(location.to_string())),
            _ => (rest, None),
        };

        if src.is_empty() || file.is_empty() {
            return Err(format!("Invalid frame: {}. SRC and FILE must not be empty", s));
        }

        Ok(Self { src: src.to_string(), file: file.to_string(), location })
    }
}

/// Extract the flat text and outbound links of a web page
#[derive(Parser, Debug)]
#[command(name = "harvest")]
#[command(author = "Harvest Contributors")]
#[command(version)]
#[command(about = "Extract text and links from web pages", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Document location for file and stdin input (default: http://localhost/)
    #[arg(long, value_name = "URL")]
    location: Option<String>,

    /// Regular expression hrefs must match
    #[arg(short, long, value_name = "REGEX", conflicts_with = "request")]
    pattern: Option<String>,

    /// CSS selector of the element whose text is collected
    #[arg(short, long, value_name = "SELECTOR", conflicts_with = "request")]
    scope: Option<String>,

    /// Extraction options as a JSON object, e.g. '{"maxLinks": 50}'
    #[arg(long, value_name = "JSON", conflicts_with = "request")]
    options: Option<String>,

    /// Positional argument array '[pattern, scope, options?]' as JSON
    #[arg(long, value_name = "JSON")]
    request: Option<String>,

    /// Walk open shadow roots
    #[arg(long)]
    include_shadow_dom: bool,

    /// Walk same-origin iframe documents (see --frame)
    #[arg(long)]
    include_iframes: bool,

    /// Keep repeated (href, text) pairs
    #[arg(long)]
    no_dedupe: bool,

    /// Maximum number of links to record
    #[arg(long, value_name = "NUM")]
    max_links: Option<usize>,

    /// Resolve relative hrefs against the document base URI
    #[arg(long)]
    use_base_element: bool,

    /// Keep //host/path hrefs
    #[arg(long)]
    allow_protocol_relative: bool,

    /// Collect text from the whole page, not only the scope element
    #[arg(long)]
    no_within_only: bool,

    /// Collect the whole document's text when the scope element is missing
    #[arg(long)]
    collect_all_without_scope: bool,

    /// Use the legacy fixed configuration (no dedupe, no cap)
    #[arg(long, conflicts_with_all = [
        "options", "request", "include_shadow_dom", "include_iframes", "no_dedupe", "max_links",
        "use_base_element", "allow_protocol_relative", "no_within_only", "collect_all_without_scope",
    ])]
    legacy: bool,

    /// Attach an iframe document: SRC=FILE[@LOCATION] (repeatable)
    #[arg(long = "frame", value_name = "SRC=FILE[@LOCATION]")]
    frames: Vec<FrameSpec>,

    /// Output format (json, text, links)
    #[arg(short, long, default_value = "json", value_name = "FORMAT")]
    format: Format,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Output the per-anchor decision report as JSON instead of the result
    #[arg(long)]
    report: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn is_url(&self) -> bool {
        self.input.starts_with("http://") || self.input.starts_with("https://")
    }

    /// Builds the request from `--request` or `--pattern`/`--scope`/`--options`,
    /// then applies the individual option flags on top.
    fn extraction_request(&self) -> anyhow::Result<ExtractionRequest> {
        if self.legacy {
            return Ok(ExtractionRequest::new(
                self.pattern.as_deref(),
                self.scope.as_deref(),
                ExtractionOptions::legacy(),
            ));
        }

        let mut request = match (&self.request, &self.options) {
            (Some(json), _) => ExtractionRequest::from_json(json).context("Invalid --request JSON")?,
            (None, Some(json)) => {
                let options = ExtractionOptions::from_json(json).context("Invalid --options JSON")?;
                ExtractionRequest::new(self.pattern.as_deref(), self.scope.as_deref(), options)
            }
            (None, None) => {
                ExtractionRequest::new(self.pattern.as_deref(), self.scope.as_deref(), ExtractionOptions::default())
            }
        };

        let options = &mut request.options;
        if self.include_shadow_dom {
            options.include_shadow_dom = true;
        }
        if self.include_iframes {
            options.include_iframes = true;
        }
        if self.no_dedupe {
            options.dedupe_links = false;
        }
        if let Some(max_links) = self.max_links {
            options.max_links = max_links;
        }
        if self.use_base_element {
            options.use_base_element = true;
        }
        if self.allow_protocol_relative {
            options.allow_protocol_relative = true;
        }
        if self.no_within_only {
            options.within_only = false;
        }
        if self.collect_all_without_scope {
            options.missing_scope = MissingScope::WholeDocument;
        }

        Ok(request)
    }
}

/// Logs go to stderr; `--verbose` forces debug, otherwise `RUST_LOG` or warn.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("harvest_core=debug,harvest=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn read_input(args: &Args) -> anyhow::Result<String> {
    if args.input == "-" {
        return fetch_stdin().context("Failed to read from stdin");
    }

    if args.is_url() {
        let config = FetchConfig {
            timeout: args.timeout,
            user_agent: args.user_agent.clone().unwrap_or_else(|| FetchConfig::default().user_agent),
        };
        return fetch_url(&args.input, &config).await.context("Failed to fetch URL");
    }

    fetch_file(&args.input).with_context(|| format!("Failed to read file: {}", args.input))
}

fn document_location(args: &Args) -> String {
    match &args.location {
        Some(location) => location.clone(),
        None if args.is_url() => args.input.clone(),
        None => DEFAULT_LOCATION.to_string(),
    }
}

fn attach_frames(doc: &mut Document, frames: &[FrameSpec]) -> anyhow::Result<()> {
    for frame in frames {
        let location = match &frame.location {
            Some(location) => location.clone(),
            None => doc
                .location()
                .join(&frame.src)
                .map(String::from)
                .with_context(|| format!("Cannot resolve frame src '{}'", frame.src))?,
        };

        let markup = fetch_file(&frame.file).with_context(|| format!("Failed to read frame file: {}", frame.file))?;
        let frame_doc = Document::parse(&markup, &location)
            .with_context(|| format!("Invalid frame location: {}", location))?;
        doc.attach_frame(frame.src.clone(), frame_doc);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
    }

    let request = args.extraction_request()?;
    if args.report && args.format.0 != OutputFormat::Json {
        bail!("--report is only available with the json format");
    }

    if args.verbose {
        let source = match args.input.as_str() {
            "-" => "stdin".to_string(),
            input => input.bright_white().underline().to_string(),
        };
        echo::print_step(1, 4, &format!("Reading from {}", source));
    }

    let html = read_input(&args).await?;
    let location = document_location(&args);
    Url::parse(&location).with_context(|| format!("Invalid --location: {}", location))?;

    if args.verbose {
        echo::print_detail("Size", echo::format_size(html.len()));
        echo::print_detail("Location", &location);
        eprintln!();
        echo::print_step(2, 4, "Parsing HTML document");
    }

    let mut doc = Document::parse(&html, &location).context("Failed to parse HTML")?;
    attach_frames(&mut doc, &args.frames)?;

    if args.verbose {
        echo::print_detail("Frames attached", args.frames.len());
        eprintln!();
        echo::print_step(3, 4, "Extracting text and links");
    }

    let started = Instant::now();
    let report = extract_with_report(&doc, request.pattern.as_deref(), request.scope.as_deref(), &request.options);

    if args.verbose {
        echo::print_timing("Extraction", started.elapsed());
        echo::print_detail("Links", report.result.links.len());
        echo::print_detail("Anchors seen", report.decisions.len());
        echo::print_detail("Text", echo::format_size(report.result.text.len()));
        for frame in &report.skipped_frames {
            echo::print_warning(&format!(
                "Skipped frame {} ({})",
                frame.src.as_deref().unwrap_or("<no src>"),
                frame.origin.as_deref().unwrap_or("not attached")
            ));
        }
        if report.truncated {
            echo::print_warning(&format!("Stopped at the link limit of {}", request.options.max_links));
        }
        eprintln!();
        echo::print_step(4, 4, "Writing output");
        echo::print_detail("Format", format!("{:?}", args.format.0));
        eprintln!();
    }

    let mut output = if args.report {
        let json = if args.pretty { serde_json::to_string_pretty(&report) } else { serde_json::to_string(&report) };
        json.context("Failed to serialize report")?
    } else {
        report.result.to_format(args.format.0, args.pretty).context("Failed to format result")?
    };
    if !output.is_empty() && !output.ends_with('\n') {
        output.push('\n');
    }

    match args.output {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            print!("{}", output);
        }
    }

    Ok(())
}
