//! Ask a question, optionally augmented with live web search, and print
//! the streamed answer.
//!
//! Talks to a local OpenAI-compatible model server (llama.cpp, Ollama,
//! LM Studio). Web search needs `SERPER_API_KEY` and `FIRECRAWL_API_KEY`
//! in the environment (or the corresponding flags); without them the
//! model answers from its own knowledge.
//!
//! # Examples
//!
//! ```sh
//! # Basic question with web search
//! lookout --user "Who won yesterday's F1 race?"
//!
//! # Pipe content from stdin
//! cat article.md | lookout --user "Is this claim still true?" --stdin
//!
//! # Offline: no web search, different runtime
//! lookout --user "Explain borrow checking" --no-web-search \
//!   --base-url http://127.0.0.1:11434 --model llama3.2:3b
//! ```

use clap::Parser;
use lookout::prelude::*;
use std::io::{self, Read, Write};
use std::process;
use std::sync::Mutex;

/// Ask a question, optionally augmented with live web search.
#[derive(Parser)]
#[command(name = "lookout")]
struct Cli {
    // ── Question content ───────────────────────────────────────
    /// The question to ask
    #[arg(long)]
    user: Option<String>,

    /// Read additional question content from stdin
    #[arg(long)]
    stdin: bool,

    // ── Model runtime ──────────────────────────────────────────
    /// Base URL of the OpenAI-compatible model server
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    base_url: String,

    /// Model name passed to the runtime
    #[arg(long, default_value = "qwen2.5:3b-instruct")]
    model: String,

    /// API key for the model runtime, if it requires one
    #[arg(long)]
    model_api_key: Option<String>,

    /// Retries for transient model-runtime errors
    #[arg(long, default_value_t = 2)]
    retries: u32,

    // ── Web search ─────────────────────────────────────────────
    /// Disable web search entirely
    #[arg(long)]
    no_web_search: bool,

    /// Serper API key (default: SERPER_API_KEY env var)
    #[arg(long)]
    serper_key: Option<String>,

    /// Firecrawl API key (default: FIRECRAWL_API_KEY env var)
    #[arg(long)]
    firecrawl_key: Option<String>,

    /// Number of top search results to read
    #[arg(long, default_value_t = DEFAULT_TOP_LINKS)]
    top_links: usize,

    /// Skip the query-conversion model call and anchor summaries to the
    /// question as written
    #[arg(long)]
    no_convert_query: bool,

    // ── Budget / sampling ──────────────────────────────────────
    /// Model context window in tokens
    #[arg(long, default_value_t = lookout::context::budget::DEFAULT_CONTEXT_WINDOW)]
    context_window: usize,

    /// Tokens reserved for prompt scaffolding and output
    #[arg(long, default_value_t = lookout::context::budget::DEFAULT_RESERVED_OVERHEAD)]
    reserved_overhead: usize,

    /// Maximum tokens in the final answer
    #[arg(long, default_value_t = 1024)]
    max_tokens: u32,

    /// Sampling temperature
    #[arg(long, default_value_t = 0.7)]
    temperature: f32,
}

fn read_stdin_content() -> Result<String, String> {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| format!("failed to read stdin: {e}"))?;
    Ok(buf)
}

fn build_question(cli: &Cli) -> Result<String, String> {
    let stdin_text = if cli.stdin {
        Some(read_stdin_content()?)
    } else {
        None
    };

    match (&cli.user, stdin_text) {
        (Some(msg), Some(piped)) => Ok(format!("{msg}\n\n{piped}")),
        (Some(msg), None) => Ok(msg.clone()),
        (None, Some(piped)) => Ok(piped),
        (None, None) => Err("provide --user, --stdin, or both".to_string()),
    }
}

/// Resolve the search/fetch clients. Missing keys disable web search with
/// a warning rather than failing the run.
fn build_providers(cli: &Cli) -> Result<(SerperClient, FirecrawlClient, bool), String> {
    let serper = match &cli.serper_key {
        Some(key) => SerperClient::new(key.clone()),
        None => SerperClient::from_env(),
    };
    let firecrawl = match &cli.firecrawl_key {
        Some(key) => FirecrawlClient::new(key.clone()),
        None => FirecrawlClient::from_env(),
    };

    match (serper, firecrawl) {
        (Ok(s), Ok(f)) => Ok((s, f, !cli.no_web_search)),
        (s, f) => {
            if !cli.no_web_search {
                if let Err(ref e) = s {
                    eprintln!("  Warning: web search disabled: {e}");
                }
                if let Err(ref e) = f {
                    eprintln!("  Warning: web search disabled: {e}");
                }
            }
            // Placeholder clients; never invoked with web search off.
            let s = match s {
                Ok(s) => s,
                Err(_) => SerperClient::new("")?,
            };
            let f = match f {
                Ok(f) => f,
                Err(_) => FirecrawlClient::new("")?,
            };
            Ok((s, f, false))
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let question = match build_question(&cli) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let budget = match TokenBudget::new(cli.context_window, cli.reserved_overhead) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let model = match LocalModelClient::new(&cli.base_url, &cli.model) {
        Ok(m) => {
            let m = m.with_retry(RetryConfig::with_retries(cli.retries));
            match &cli.model_api_key {
                Some(key) => m.with_api_key(key.clone()),
                None => m,
            }
        }
        Err(e) => {
            eprintln!("Error: failed to create model client: {e}");
            process::exit(1);
        }
    };

    let tokenizer = match Cl100kTokenizer::new() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let (search, fetch, web_search_enabled) = match build_providers(&cli) {
        Ok(providers) => providers,
        Err(e) => {
            eprintln!("Error: failed to create web clients: {e}");
            process::exit(1);
        }
    };

    let status = FnStatusSink::new(|status| {
        if let Some(text) = status {
            eprintln!("  · {text}");
        }
    });

    let config = OrchestratorConfig::default()
        .with_top_links(cli.top_links)
        .with_budget(budget)
        .with_max_answer_tokens(cli.max_tokens)
        .with_temperature(cli.temperature)
        .with_convert_query(!cli.no_convert_query);

    // Snapshots replace the whole answer; on a terminal we print only the
    // new suffix when a snapshot extends the previous one, and reprint
    // from a fresh line when it does not.
    let printed = Mutex::new(String::new());

    let orchestrator = Orchestrator::new(&model, &search, &fetch, &tokenizer)
        .with_status(&status)
        .with_config(config);
    let result = orchestrator
        .run_turn(vec![Message::user(question)], web_search_enabled, |snapshot| {
            let mut printed = printed.lock().unwrap();
            let mut out = io::stdout().lock();
            if let Some(suffix) = snapshot.strip_prefix(printed.as_str()) {
                let _ = out.write_all(suffix.as_bytes());
            } else {
                let _ = out.write_all(format!("\n{snapshot}").as_bytes());
            }
            let _ = out.flush();
            *printed = snapshot.to_string();
        })
        .await;

    match result {
        Ok(_) => println!(),
        Err(e) => {
            eprintln!("\nError: {e}");
            process::exit(1);
        }
    }
}
