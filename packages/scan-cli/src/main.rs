// Command-line driver for the evidence-collection engine

use anyhow::{bail, Context, Result};
use colored::Colorize;
use console::Term;
use std::env;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use diligence::{
    CollectionDepth, CollectionRequest, CollectionResult, Collector, HttpFetcher, MockWebSearcher,
    RateLimitedFetcher, TavilyWebSearcher, WebSearcher,
};

struct Args {
    domain: String,
    company: String,
    thesis: Option<String>,
    depth: CollectionDepth,
}

fn parse_args() -> Result<Args> {
    let mut args = env::args().skip(1);
    let domain = args.next().context(USAGE)?;
    let company = args.next().context(USAGE)?;

    let mut thesis = None;
    let mut depth = CollectionDepth::Deep;

    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--thesis" => thesis = Some(args.next().context("--thesis needs a value")?),
            "--depth" => {
                depth = match args.next().context("--depth needs a value")?.as_str() {
                    "shallow" => CollectionDepth::Shallow,
                    "deep" => CollectionDepth::Deep,
                    "comprehensive" => CollectionDepth::Comprehensive,
                    other => bail!("unknown depth: {}", other),
                }
            }
            other => bail!("unknown flag: {}", other),
        }
    }

    Ok(Args {
        domain,
        company,
        thesis,
        depth,
    })
}

const USAGE: &str = "usage: scan <domain> <company> [--thesis TAG] [--depth shallow|deep|comprehensive]";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,diligence=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    let args = parse_args()?;

    let fetcher = Arc::new(RateLimitedFetcher::new(
        HttpFetcher::new().with_user_agent("DiligenceScan/0.1"),
        5,
    ));

    let searcher: Arc<dyn WebSearcher> = match env::var("TAVILY_API_KEY") {
        Ok(key) => Arc::new(TavilyWebSearcher::new(key)),
        Err(_) => {
            tracing::warn!("TAVILY_API_KEY not set; external search disabled");
            Arc::new(MockWebSearcher::new())
        }
    };

    let collector = Collector::new(fetcher, searcher);

    let mut request = CollectionRequest::new(&args.domain, &args.company).with_depth(args.depth);
    if let Some(thesis) = &args.thesis {
        request = request.with_thesis(thesis);
    }

    println!(
        "{} {} ({})",
        "Scanning".bright_green().bold(),
        args.domain.bold(),
        args.company
    );

    let result = collector
        .collect(&request)
        .await
        .context("Collection failed")?;

    print_report(&args, &result)?;
    Ok(())
}

fn print_report(args: &Args, result: &CollectionResult) -> Result<()> {
    let term = Term::stdout();
    term.write_line("")?;

    println!("{}", "── Coverage ──────────────────────────".bright_blue());
    println!(
        "  {} evidence items from {} actions",
        result.evidence.len().to_string().bold(),
        result.summary.total_actions
    );
    println!(
        "  coverage: {}  quality: {:?}",
        format!("{:.0}%", result.summary.coverage_percentage).bold(),
        result.summary.overall_quality
    );
    if !result.summary.missing_categories.is_empty() {
        println!(
            "  {} {}",
            "missing:".yellow(),
            result.summary.missing_categories.join(", ")
        );
    }

    println!();
    println!("{}", "── Evidence by tool ──────────────────".bright_blue());
    let mut by_tool: Vec<_> = result.summary.evidence_by_tool.iter().collect();
    by_tool.sort_by(|a, b| b.1.cmp(a.1));
    for (tool, count) in by_tool {
        println!("  {:<24} {}", tool, count);
    }

    println!();
    println!("{}", "── Top evidence ──────────────────────".bright_blue());
    for item in result.evidence.iter().take(15) {
        println!(
            "  [{:.2}] {} {} {}",
            item.score,
            item.category.bright_white().bold(),
            serde_json::to_string(&item.value)?,
            item.source_url.dimmed()
        );
    }

    println!();
    println!(
        "{} scan of {} complete",
        "✓".bright_green(),
        args.domain.bold()
    );
    Ok(())
}
