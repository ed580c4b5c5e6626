//! CLI binary for edgequake-md2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints one line per produced PDF.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_md2pdf::pipeline::input::expand_patterns;
use edgequake_md2pdf::{
    BatchReport, ConversionConfig, ConversionOutput, ConversionProgressCallback, FileOutcome,
    FontSize, MarkdownConverter, Md2PdfError, PaperSize, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal reporter: one ✓/✗ line per file, printed above an optional
/// progress bar.
struct CliProgressCallback {
    /// Hidden when `--no-progress`, `--quiet` or `--json` is set.
    bar: Option<ProgressBar>,
    /// Print ✓ lines (off for `--quiet` and `--json`).
    report_success: bool,
    verbose: bool,
}

impl CliProgressCallback {
    fn new(show_bar: bool, report_success: bool, verbose: bool) -> Arc<Self> {
        let bar = show_bar.then(|| {
            let bar = ProgressBar::new(0);
            let style = ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} files  \
                 ⏱ {elapsed_precise}  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
            bar.set_style(style);
            bar.set_prefix("Converting");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });

        Arc::new(Self {
            bar,
            report_success,
            verbose,
        })
    }

    fn out(&self, line: String) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => println!("{line}"),
        }
    }

    fn err(&self, line: String) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }

    fn success(&self, input: &Path, output: &Path) {
        if !self.report_success {
            return;
        }
        if self.verbose {
            self.out(format!(
                "{} Converted: {} -> {}",
                green("✓"),
                input.display(),
                bold(&output.display().to_string())
            ));
        } else {
            self.out(format!("{} {}", green("✓"), output.display()));
        }
    }

    fn failure(&self, input: &Path, error: &str) {
        self.err(format!(
            "{} Error: {} - {}",
            red("✗"),
            input.display(),
            red(error)
        ));
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        if let Some(bar) = &self.bar {
            bar.set_length(total as u64);
            bar.reset_eta();
        }
    }

    fn on_file_start(&self, _index: usize, _total: usize, input: &Path) {
        if let Some(bar) = &self.bar {
            bar.set_message(input.display().to_string());
        }
        if self.verbose && self.report_success {
            self.out(format!("{} Converting: {}", cyan("◆"), input.display()));
        }
    }

    fn on_file_complete(&self, _index: usize, _total: usize, input: &Path, output: &Path) {
        self.success(input, output);
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn on_file_error(&self, _index: usize, _total: usize, input: &Path, error: &str) {
        self.failure(input, error);
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn on_batch_complete(&self, _total: usize, _success_count: usize) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one file (writes README.pdf next to it)
  md2pdf README.md

  # Convert to a specific file
  md2pdf guide.md -o out/guide.pdf

  # Convert every Markdown file in docs/ to its own PDF
  md2pdf "docs/*.md"

  # Merge several files into one PDF, one page break between files
  md2pdf --merge intro.md usage.md faq.md -o manual.pdf

  # Merge without page breaks, large font, Letter paper
  md2pdf --merge --no-page-break --font-size large --paper letter "ch*.md"

  # Inspect the HTML that is sent to the browser
  DEBUG_HTML=1 md2pdf notes.md

NESTED CODE BLOCKS:
  Fenced blocks that contain fences print as written. Use a longer outer
  fence (````) or an info string on the inner opening fence (```python).

TABLE OF CONTENTS:
  A line containing only [TOC] is replaced by a linked list of the
  document's level-2 and level-3 headings (see --toc-depth).

ENVIRONMENT VARIABLES:
  DEBUG_HTML       Write <output>.debug.html next to each PDF
  MD2PDF_CHROME    Path to a Chrome/Chromium binary
  RUST_LOG         Override log filtering (e.g. RUST_LOG=edgequake_md2pdf=debug)

SETUP:
  A Chrome or Chromium installation is required. It is auto-detected from
  PATH and the usual install locations; pass --chrome to choose one.
"#;

/// Convert Markdown files to PDF.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "Convert Markdown files to PDF",
    long_about = "Convert Markdown files to PDF through headless Chrome. Handles nested \
code fences, GitHub-flavoured tables, task lists and footnotes, [TOC] markers and local \
images. Several files can be converted one by one or merged into a single PDF.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown files or glob patterns (quote patterns to stop shell expansion).
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output PDF path (single file, or with --merge).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print detailed progress.
    #[arg(short, long, env = "MD2PDF_VERBOSE")]
    verbose: bool,

    /// Merge all inputs into one PDF.
    #[arg(long)]
    merge: bool,

    /// Do not insert page breaks between merged files (with --merge).
    #[arg(long)]
    no_page_break: bool,

    /// Font-size preset.
    #[arg(long, env = "MD2PDF_FONT_SIZE", value_enum, default_value = "medium")]
    font_size: FontSizeArg,

    /// Paper size.
    #[arg(long, env = "MD2PDF_PAPER", value_enum, default_value = "a4")]
    paper: PaperArg,

    /// Page margin in centimetres (0–10).
    #[arg(long, env = "MD2PDF_MARGIN", default_value_t = 2.0)]
    margin: f64,

    /// Leave [TOC] markers as plain text.
    #[arg(long)]
    no_toc: bool,

    /// Deepest heading level listed in a [TOC] (2–6).
    #[arg(long, default_value_t = 3,
          value_parser = clap::value_parser!(u8).range(2..=6))]
    toc_depth: u8,

    /// Keep local image references instead of inlining them.
    #[arg(long)]
    no_embed_images: bool,

    /// Write the assembled HTML next to each PDF as <name>.debug.html.
    #[arg(long, env = "DEBUG_HTML")]
    debug_html: bool,

    /// Chrome/Chromium binary to use (auto-detected if omitted).
    #[arg(long, env = "MD2PDF_CHROME")]
    chrome: Option<PathBuf>,

    /// Code highlighting theme (e.g. InspiredGitHub, base16-ocean.light).
    #[arg(long, env = "MD2PDF_THEME", default_value = "InspiredGitHub")]
    theme: String,

    /// Browser idle timeout in seconds.
    #[arg(long, env = "MD2PDF_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Print the conversion report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "MD2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MD2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FontSizeArg {
    Small,
    Medium,
    Large,
}

impl From<FontSizeArg> for FontSize {
    fn from(v: FontSizeArg) -> Self {
        match v {
            FontSizeArg::Small => FontSize::Small,
            FontSizeArg::Medium => FontSize::Medium,
            FontSizeArg::Large => FontSize::Large,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PaperArg {
    A4,
    Letter,
    Legal,
}

impl From<PaperArg> for PaperSize {
    fn from(v: PaperArg) -> Self {
        match v {
            PaperArg::A4 => PaperSize::A4,
            PaperArg::Letter => PaperSize::Letter,
            PaperArg::Legal => PaperSize::Legal,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar and the ✓/✗ lines provide the feedback that matters.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Resolve inputs ───────────────────────────────────────────────────
    let inputs = expand_patterns(&cli.inputs);
    if inputs.is_empty() {
        return Err(Md2PdfError::NoMatches {
            patterns: cli.inputs.clone(),
        })
        .context("Nothing to convert");
    }
    if inputs.len() > 1 && cli.output.is_some() && !cli.merge {
        anyhow::bail!("-o/--output with several input files requires --merge");
    }
    if cli.no_page_break && !cli.merge {
        warn!("--no-page-break only applies with --merge; ignoring");
    }

    // ── Build config ─────────────────────────────────────────────────────
    let reporter = CliProgressCallback::new(
        show_progress && !cli.merge && inputs.len() > 1,
        !cli.quiet && !cli.json,
        cli.verbose,
    );
    let config = build_config(&cli, Arc::clone(&reporter) as ProgressCallback)?;
    let converter = MarkdownConverter::new(config).context("Failed to initialise converter")?;

    // ── Merge mode ───────────────────────────────────────────────────────
    if cli.merge {
        if cli.verbose {
            let names: Vec<_> = inputs.iter().map(|p| p.display().to_string()).collect();
            eprintln!("{} Merging: {}", cyan("◆"), names.join(", "));
        }
        let output = converter
            .merge_files(&inputs, cli.output.as_deref())
            .await
            .context("Merge failed")?;
        reporter.success(&inputs[0], &output.output_path);
        print_warnings(&cli, &output);
        if cli.json {
            print_json(&output)?;
        }
        return Ok(());
    }

    // ── One PDF per input ────────────────────────────────────────────────
    let report = match cli.output.as_deref() {
        Some(out) => single_with_output(&converter, &reporter, &inputs[0], out).await,
        None => converter.convert_batch(&inputs).await,
    };

    for outcome in &report.outcomes {
        if let FileOutcome::Converted { output, .. } = outcome {
            print_warnings(&cli, output);
        }
    }

    if cli.json {
        print_json(&report)?;
    } else if cli.verbose {
        eprintln!(
            "\n{} {} converted, {} failed  {}",
            if report.failure_count() == 0 {
                green("✔")
            } else {
                red("✘")
            },
            bold(&report.success_count().to_string()),
            report.failure_count(),
            dim(&format!("{}ms", report.total_duration_ms)),
        );
    }

    if let Err(e) = report.into_result() {
        if !cli.quiet && !cli.json && !cli.verbose {
            eprintln!("{} {}", red("✘"), e);
        }
        std::process::exit(1);
    }
    Ok(())
}

/// `md2pdf file.md -o out.pdf`: same reporting as a one-file batch.
async fn single_with_output(
    converter: &MarkdownConverter,
    reporter: &CliProgressCallback,
    input: &Path,
    output: &Path,
) -> BatchReport {
    let start = Instant::now();
    reporter.on_file_start(1, 1, input);
    let outcome = match converter.convert_file(input, Some(output)).await {
        Ok(out) => {
            reporter.on_file_complete(1, 1, input, &out.output_path);
            FileOutcome::Converted {
                input: input.to_path_buf(),
                output: out,
            }
        }
        Err(e) => {
            let error = e.to_string();
            reporter.on_file_error(1, 1, input, &error);
            FileOutcome::Failed {
                input: input.to_path_buf(),
                error,
            }
        }
    };
    BatchReport {
        outcomes: vec![outcome],
        total_duration_ms: start.elapsed().as_millis() as u64,
    }
}

fn print_warnings(cli: &Cli, output: &ConversionOutput) {
    if cli.quiet {
        return;
    }
    for w in &output.warnings {
        eprintln!("  {} {}", cyan("⚠"), w);
    }
    if let Some(ref p) = output.debug_html_path {
        eprintln!("  {} Debug HTML: {}", dim("·"), p.display());
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise report")?;
    println!("{json}");
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: ProgressCallback) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .font_size(cli.font_size.into())
        .paper(cli.paper.into())
        .margin_cm(cli.margin)
        .page_break(!cli.no_page_break)
        .toc(!cli.no_toc)
        .toc_max_level(cli.toc_depth)
        .embed_images(!cli.no_embed_images)
        .debug_html(cli.debug_html)
        .highlight_theme(cli.theme.clone())
        .render_timeout_secs(cli.timeout)
        .progress_callback(progress);

    if let Some(ref chrome) = cli.chrome {
        builder = builder.chrome_path(chrome.clone());
    }

    builder.build().context("Invalid configuration")
}
