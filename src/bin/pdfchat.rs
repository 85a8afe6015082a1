//! CLI binary for edgequake-pdfchat.
//!
//! A thin shim over the library crate: maps CLI flags to `SessionConfig`,
//! loads the PDFs into a `Session`, runs one mode and prints results.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_pdfchat::{
    ExportKind, Language, LoadReport, Mode, PdfChatError, Session, SessionConfig,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
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

const AFTER_HELP: &str = r#"EXAMPLES:
  # Ask one question
  pdfchat chat report.pdf -q "What are the key findings?"

  # Ask about a specific page
  pdfchat chat report.pdf -q "Summarise page 4"

  # Interactive chat over several PDFs, export the transcript
  pdfchat chat a.pdf https://example.com/b.pdf --export chat.pdf

  # Summarise every document
  pdfchat summarize a.pdf b.pdf --export summaries.pdf

  # Translate every page to Tamil (no API key needed)
  pdfchat translate report.pdf --lang ta --export out/

REPL COMMANDS (chat without -q):
  /load PATH      load another PDF (path or URL)
  /stats          documents and pages loaded
  /export [PATH]  write the transcript as PDF
  /clear          drop all documents and messages
  /quit           leave

LANGUAGES:
  en English   ta Tamil     hi Hindi     es Spanish   fr French
  de German    zh Chinese   ar Arabic    ru Russian   pt Portuguese
  ja Japanese  ko Korean    it Italian

ENVIRONMENT VARIABLES:
  GROQ_API_KEY            Groq API key (chat and summaries)
  PDFCHAT_MODEL           Override model ID (default: llama-3.3-70b-versatile)
  EDGEQUAKE_PROVIDER      Use an edgequake-llm provider instead of Groq
  EDGEQUAKE_LLM_PROVIDER  Provider fallback, together with EDGEQUAKE_MODEL
  EDGEQUAKE_MODEL         Model for EDGEQUAKE_LLM_PROVIDER
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Log filter, overrides --verbose/--quiet
"#;

/// Chat with, summarise and translate PDF documents.
#[derive(Parser, Debug)]
#[command(
    name = "pdfchat",
    version,
    about = "Chat with, summarise and translate PDF documents",
    long_about = "Load PDF documents (local files or URLs) and ask questions about them, \
summarise them, or translate every page. Chat and summaries use Groq by default or any \
edgequake-llm provider; translation uses Google Translate and needs no key.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask questions about the documents (interactive without -q).
    Chat {
        /// Local PDF file paths or HTTP/HTTPS URLs.
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Question to ask; repeat for several. Omit for an interactive session.
        #[arg(short = 'q', long = "question")]
        questions: Vec<String>,
    },
    /// Summarise each document.
    Summarize {
        /// Local PDF file paths or HTTP/HTTPS URLs.
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// Translate every page of every document.
    Translate {
        /// Local PDF file paths or HTTP/HTTPS URLs.
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Target language: ISO code (ta, fr, …) or English name.
        #[arg(short, long, env = "PDFCHAT_LANG", value_parser = parse_language)]
        lang: Language,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Groq API key.
    #[arg(long, global = true, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// LLM model ID.
    #[arg(long, global = true, env = "PDFCHAT_MODEL")]
    model: Option<String>,

    /// edgequake-llm provider: openai, anthropic, gemini, ollama, …
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// PDF user password for encrypted documents.
    #[arg(long, global = true, env = "PDFCHAT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Character budget for chat context.
    #[arg(long, global = true, env = "PDFCHAT_BUDGET", default_value_t = 7000)]
    budget: usize,

    /// Max LLM output tokens per answer or summary.
    #[arg(long, global = true, env = "PDFCHAT_MAX_TOKENS", default_value_t = 1500)]
    max_tokens: usize,

    /// HTTP download timeout in seconds.
    #[arg(long, global = true, env = "PDFCHAT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-call API timeout in seconds.
    #[arg(long, global = true, env = "PDFCHAT_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Write the result to this file (or into this directory with a default name).
    #[arg(long, global = true)]
    export: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDFCHAT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(long, global = true, env = "PDFCHAT_QUIET")]
    quiet: bool,
}

fn parse_language(s: &str) -> std::result::Result<Language, String> {
    s.parse::<Language>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let common = &cli.common;

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if common.verbose {
        "debug"
    } else if common.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(common)?;
    let mut session = Session::new(config).context("Failed to start session")?;

    let (mode, inputs) = match &cli.command {
        Command::Chat { inputs, .. } => (Mode::Chat, inputs),
        Command::Summarize { inputs } => (Mode::Summary, inputs),
        Command::Translate { inputs, .. } => (Mode::Translate, inputs),
    };
    if !session.can_run(mode) {
        return Err(PdfChatError::MissingCredential.into());
    }

    let report = session
        .load_pdfs(inputs.as_slice())
        .await
        .context("Failed to load PDFs")?;
    if !common.quiet {
        print_load_report(&report, &session);
    }

    match cli.command {
        Command::Chat { questions, .. } => {
            if questions.is_empty() {
                repl(&mut session, common).await?;
            } else {
                for q in &questions {
                    ask_and_print(&mut session, q, common.json).await;
                }
                if common.json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(session.transcript())
                            .context("Failed to serialise transcript")?
                    );
                }
            }
            if let Some(ref path) = common.export {
                export(&session, ExportKind::Chat, Some(path), common.quiet)?;
            }
        }
        Command::Summarize { .. } => {
            let summaries = session
                .summarize_all()
                .await
                .context("Summarisation failed")?;
            if common.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(summaries)
                        .context("Failed to serialise summaries")?
                );
            } else {
                for (name, summary) in summaries {
                    println!("{}", bold(name));
                    if summary.is_ok() {
                        println!("{}\n", summary.text());
                    } else {
                        println!("{}\n", red(&summary.text()));
                    }
                }
            }
            if let Some(ref path) = common.export {
                export(&session, ExportKind::Summaries, Some(path), common.quiet)?;
            }
        }
        Command::Translate { lang, .. } => {
            let translations = session
                .translate_all(lang)
                .await
                .context("Translation failed")?;
            if common.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(translations)
                        .context("Failed to serialise translations")?
                );
            } else {
                for (name, pages) in translations {
                    println!("{}", bold(&format!("File: {name}  →  {lang}")));
                    for page in pages {
                        println!("{}", cyan(&format!("--- Page {} ---", page.page_num)));
                        if page.is_failed() {
                            println!("{}\n", red(&page.text()));
                        } else {
                            println!("{}\n", page.text());
                        }
                    }
                }
            }
            if let Some(ref path) = common.export {
                export(&session, ExportKind::Translations, Some(path), common.quiet)?;
            }
        }
    }

    Ok(())
}

/// Map CLI args to `SessionConfig`.
fn build_config(common: &CommonArgs) -> Result<SessionConfig> {
    let mut builder = SessionConfig::builder()
        .context_budget(common.budget)
        .max_tokens(common.max_tokens)
        .download_timeout_secs(common.download_timeout)
        .api_timeout_secs(common.api_timeout);

    if let Some(ref key) = common.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref model) = common.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = common.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref pwd) = common.password {
        builder = builder.password(pwd.clone());
    }

    builder.build().context("Invalid configuration")
}

fn print_load_report(report: &LoadReport, session: &Session) {
    for name in &report.added {
        let pages = session
            .documents()
            .get(name)
            .map(|d| d.page_count())
            .unwrap_or(0);
        eprintln!("{}  {}  {}", green("✔"), name, dim(&format!("{pages} pages")));
    }
    for name in &report.skipped {
        eprintln!("{}  {}  {}", cyan("⚠"), name, dim("already loaded, skipped"));
    }
    let stats = session.stats();
    eprintln!(
        "   {} document(s), {} page(s)",
        stats.documents, stats.total_pages
    );
}

async fn ask_and_print(session: &mut Session, query: &str, json: bool) {
    match session.ask(query).await {
        Ok(reply) => {
            if !json {
                println!("{}\n", reply.answer);
            }
        }
        Err(e) => eprintln!("{} {}", red("✘"), e),
    }
}

/// Interactive chat on stdin until EOF or `/quit`.
async fn repl(session: &mut Session, common: &CommonArgs) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        eprint!("{} ", bold(">"));
        io::stderr().flush().ok();

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((c, a)) => (c, a.trim()),
            None => (line, ""),
        };

        match command {
            "/quit" | "/exit" => break,
            "/stats" => {
                let stats = session.stats();
                eprintln!(
                    "{} document(s), {} page(s), {} message(s)",
                    stats.documents, stats.total_pages, stats.messages
                );
            }
            "/clear" => {
                session.clear();
                eprintln!("{}", dim("Session cleared. Use /load PATH to add documents."));
            }
            "/load" if !arg.is_empty() => match session.load_pdfs(&[arg]).await {
                Ok(report) => print_load_report(&report, session),
                Err(e) => eprintln!("{} {}", red("✘"), e),
            },
            "/export" => {
                let path = (!arg.is_empty()).then(|| Path::new(arg));
                if let Err(e) = export(session, ExportKind::Chat, path, common.quiet) {
                    eprintln!("{} {:#}", red("✘"), e);
                }
            }
            c if c.starts_with('/') => {
                eprintln!("{}", dim("Commands: /load PATH, /stats, /export [PATH], /clear, /quit"));
            }
            _ => ask_and_print(session, line, false).await,
        }
    }

    if common.json {
        println!(
            "{}",
            serde_json::to_string_pretty(session.transcript())
                .context("Failed to serialise transcript")?
        );
    }
    Ok(())
}

/// Write an export. A directory (or no path) gets the default file name.
fn export(session: &Session, kind: ExportKind, path: Option<&Path>, quiet: bool) -> Result<()> {
    let default_name = kind.default_file_name(chrono::Local::now());
    let target = match path {
        Some(p) if p.is_dir() => p.join(default_name),
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(default_name),
    };
    if target.as_os_str().is_empty() {
        bail!("Export path is empty");
    }

    session
        .export_to_file(kind, &target)
        .with_context(|| format!("Failed to export to {}", target.display()))?;
    if !quiet {
        eprintln!("{}  wrote {}", green("✔"), bold(&target.display().to_string()));
    }
    Ok(())
}
