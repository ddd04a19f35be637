//! Link exhibit and Bates citations in a Markdown document
//!
//! Reads a Markdown (or plain-text) document, links every citation that
//! resolves to a file in the exhibit folder, and writes the linked document.
//!
//! Usage:
//!   exhibit_link brief.md --folder exhibits
//!   exhibit_link brief.md --folder production --bates SMITH_ --output brief.linked.md
//!   exhibit_link brief.md --folder exhibits --exemplar "Ex. 5, Memo, at p. 25" --exemplar-page 25
//!   exhibit_link --folder exhibits --normalize-names [--apply]
//!
//! Options:
//!   --folder DIR          Folder holding the exhibits (required)
//!   --bates PREFIX        Link Bates stamps with this prefix instead of exhibit references
//!   --exemplar TEXT       Example page citation for page automation
//!   --exemplar-page N     Page cited by the exemplar
//!   --black               Black, non-underlined links
//!   --config FILE         JSON linker configuration
//!   --output FILE         Output path (default: <input>.linked.md)
//!   --manifest FILE       Also write a JSON manifest of the links
//!   --normalize-names     Normalize exhibit file names in --folder (dry run unless --apply)
//!   --apply               Actually rename when normalizing names
//!   --verbose, -v         Debug logging

use exhibit_anchor::export::{ExportSink, ManifestSink};
use exhibit_anchor::{
    rename_files_in_folder, ExhibitLinker, LinkStyle, LinkerConfig, TextDocument,
};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Debug, Default)]
struct LinkArgs {
    input: Option<PathBuf>,
    folder: Option<PathBuf>,
    bates: Option<String>,
    exemplar: Option<String>,
    exemplar_page: Option<u32>,
    black: bool,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    manifest: Option<PathBuf>,
    normalize_names: bool,
    apply: bool,
    verbose: bool,
}

impl LinkArgs {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let mut parsed = Self::default();

        let mut i = 1;
        while i < args.len() {
            let arg = args[i].as_str();
            let mut value = || {
                i += 1;
                args.get(i)
                    .cloned()
                    .ok_or_else(|| format!("{} needs a value", arg))
            };
            match arg {
                "--folder" => parsed.folder = Some(PathBuf::from(value()?)),
                "--bates" => parsed.bates = Some(value()?),
                "--exemplar" => parsed.exemplar = Some(value()?),
                "--exemplar-page" => {
                    let raw = value()?;
                    let page = raw
                        .parse()
                        .map_err(|_| format!("--exemplar-page expects a number, got '{}'", raw))?;
                    parsed.exemplar_page = Some(page);
                },
                "--black" => parsed.black = true,
                "--config" => parsed.config = Some(PathBuf::from(value()?)),
                "--output" | "-o" => parsed.output = Some(PathBuf::from(value()?)),
                "--manifest" => parsed.manifest = Some(PathBuf::from(value()?)),
                "--normalize-names" => parsed.normalize_names = true,
                "--apply" => parsed.apply = true,
                "--verbose" | "-v" => parsed.verbose = true,
                other if other.starts_with('-') => return Err(format!("Unknown option '{}'", other)),
                other => {
                    if parsed.input.is_some() {
                        return Err(format!("Unexpected argument '{}'", other));
                    }
                    parsed.input = Some(PathBuf::from(other));
                },
            }
            i += 1;
        }

        Ok(parsed)
    }
}

fn usage() -> ! {
    eprintln!("Usage: exhibit_link <input.md> --folder <dir> [--bates PREFIX]");
    eprintln!("                    [--exemplar TEXT --exemplar-page N] [--black] [--config FILE]");
    eprintln!("                    [--output FILE] [--manifest FILE] [--verbose]");
    eprintln!("       exhibit_link --folder <dir> --normalize-names [--apply]");
    process::exit(2);
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    input.with_file_name(format!("{}.linked.md", stem))
}

fn normalize_names(folder: &Path, apply: bool) -> exhibit_anchor::Result<()> {
    let summary = rename_files_in_folder(folder, !apply)?;
    let verb = if apply { "Renamed" } else { "Would rename" };
    for (from, to) in &summary.renamed {
        println!("{}: '{}' -> '{}'", verb, from, to);
    }
    for failure in &summary.failed {
        println!("Failed:  '{}' -> '{}' ({})", failure.from, failure.to, failure.reason);
    }
    println!(
        "{} to rename, {} failed, {} unchanged",
        summary.renamed.len(),
        summary.failed.len(),
        summary.unchanged.len()
    );
    Ok(())
}

fn run(args: LinkArgs) -> exhibit_anchor::Result<()> {
    let Some(folder) = args.folder.clone() else {
        usage();
    };
    if args.normalize_names {
        return normalize_names(&folder, args.apply);
    }
    let Some(input) = args.input.clone() else {
        usage();
    };

    let mut config = match &args.config {
        Some(path) => LinkerConfig::from_json_file(path)?,
        None => LinkerConfig::default(),
    };
    if args.black {
        config = config.with_link_style(LinkStyle::Black);
    }
    let base = input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    if config.link_base.is_none() {
        config = config.with_link_base(base);
    }

    let mut linker = ExhibitLinker::new(config);
    match &args.bates {
        Some(prefix) => linker.configure_bates(prefix, &folder)?,
        None => linker.set_target_folder(&folder)?,
    }
    match (&args.exemplar, args.exemplar_page) {
        (Some(exemplar), Some(page)) => {
            linker.configure_page_automation(exemplar, page)?;
            if let Some(pattern) = linker.page_automation() {
                println!("Page automation on (form '{}')", pattern.page_form());
            }
        },
        (None, None) => {},
        _ => {
            eprintln!("--exemplar and --exemplar-page must be given together");
            usage();
        },
    }

    let mut doc = TextDocument::from_file(&input)?;
    let report = linker.scan_in_session(&mut doc)?;

    let output = args.output.clone().unwrap_or_else(|| default_output(&input));
    doc.write_to(&output)?;

    if let Some(path) = &args.manifest {
        ManifestSink::new(path).export(&report)?;
    }

    for (region, count) in report.per_region_counts.iter().filter(|(_, c)| **c > 0) {
        println!("  {:<16} {}", region, count);
    }
    println!("Linked {} citation(s)", report.total_annotated);
    println!("Output: {}", output.display());
    Ok(())
}

fn main() {
    let args = match LinkArgs::from_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            usage();
        },
    };

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
