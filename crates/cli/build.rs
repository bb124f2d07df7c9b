use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let Some(out_dir) = env::var_os("OUT_DIR").map(PathBuf::from) else {
        return;
    };
    let completions_dir = out_dir.join("completions");

    if let Err(e) = fs::create_dir_all(&completions_dir) {
        println!("cargo:warning=Could not create completions directory: {}", e);
        return;
    }

    let mut cmd = clap::Command::new("harvest")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Harvest Contributors")
        .about("Extract text and links from web pages")
        .arg(clap::arg!(<INPUT> "URL to fetch, local HTML file, or '-' for stdin"))
        .arg(clap::arg!(--location <URL> "Document location for file and stdin input"))
        .arg(clap::arg!(-p --pattern <REGEX> "Regular expression hrefs must match"))
        .arg(clap::arg!(-s --scope <SELECTOR> "CSS selector of the element whose text is collected"))
        .arg(clap::arg!(--options <JSON> "Extraction options as a JSON object"))
        .arg(clap::arg!(--request <JSON> "Positional argument array as JSON"))
        .arg(clap::arg!(--"include-shadow-dom" "Walk open shadow roots"))
        .arg(clap::arg!(--"include-iframes" "Walk same-origin iframe documents"))
        .arg(clap::arg!(--"no-dedupe" "Keep repeated (href, text) pairs"))
        .arg(clap::arg!(--"max-links" <NUM> "Maximum number of links to record"))
        .arg(clap::arg!(--"use-base-element" "Resolve relative hrefs against the document base URI"))
        .arg(clap::arg!(--"allow-protocol-relative" "Keep //host/path hrefs"))
        .arg(clap::arg!(--"no-within-only" "Collect text from the whole page"))
        .arg(clap::arg!(--"collect-all-without-scope" "Collect the whole document's text when the scope is missing"))
        .arg(clap::arg!(--legacy "Use the legacy fixed configuration"))
        .arg(
            clap::arg!(--frame <SPEC> "Attach an iframe document: SRC=FILE[@LOCATION]")
                .action(clap::ArgAction::Append),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (json, text, links)")
                .value_name("FORMAT")
                .default_value("json")
                .value_parser(["json", "text", "links"]),
        )
        .arg(clap::arg!(--pretty "Pretty-print JSON output"))
        .arg(clap::arg!(--report "Output the per-anchor decision report"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("30"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    for shell in [
        clap_complete::Shell::Bash,
        clap_complete::Shell::Zsh,
        clap_complete::Shell::Fish,
        clap_complete::Shell::PowerShell,
    ] {
        if let Err(e) = clap_complete::generate_to(shell, &mut cmd, "harvest", &completions_dir) {
            println!("cargo:warning=Could not generate {} completions: {}", shell, e);
        }
    }
}
