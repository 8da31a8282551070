//! CLI command implementations.
//!
//! Each invocation is one [`Request`]. Requests form a closed set and
//! every kind maps to exactly one handler below.

use clap::{Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use ssot_core::{CategoryFilter, Document, SsotConfig};
use ssot_graph::{CrossRefReport, ReferenceGraph};
use ssot_index::{
    rank, validate_corpus_tags, validate_tags, CasingIssue, DocumentIssues, Query, QueryResult,
    TermIndex, UndefinedTerm, Vocabulary,
};
use ssot_loader::{load_corpus, CancelFlag, Corpus, LoadError};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Sample sizes used in analysis findings.
const SAMPLE_ORPHANS: usize = 5;
const SAMPLE_CYCLES: usize = 3;
const SAMPLE_TERMS: usize = 5;

/// Lines printed per list in human-readable output.
const LIST_LIMIT: usize = 10;

/// Which part of the graph to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphView {
    Orphans,
    Cycles,
    Dangling,
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum TaxonomyAction {
    /// Report term usage, undefined terms and casing drift
    Analyze,

    /// Validate front matter tags against the vocabulary
    Validate {
        /// A single markdown file (defaults to the whole repository)
        file: Option<PathBuf>,
    },
}

/// Combined analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Crossref,
    Orphans,
    Taxonomy,
    Full,
}

impl AnalysisKind {
    fn includes_crossref(&self) -> bool {
        matches!(self, Self::Crossref | Self::Orphans | Self::Full)
    }

    fn includes_taxonomy(&self) -> bool {
        matches!(self, Self::Taxonomy | Self::Full)
    }
}

/// One unit of work for the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Init,
    Status,
    Query {
        question: String,
        category: CategoryFilter,
        topic: Option<String>,
        limit: Option<usize>,
    },
    Graph(GraphView),
    Taxonomy(TaxonomyAction),
    Analyze(AnalysisKind),
}

impl Request {
    /// Name recorded on the request span.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Status => "status",
            Self::Query { .. } => "query",
            Self::Graph(_) => "graph",
            Self::Taxonomy(_) => "taxonomy",
            Self::Analyze(_) => "analyze",
        }
    }
}

/// State shared by the handlers of one request.
struct Context {
    root: PathBuf,
    config: SsotConfig,
    json: bool,
    run_id: Uuid,
}

/// Runs a request against the repository at `root`.
pub async fn run(root: &Path, json: bool, request: Request) -> Result<()> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("request", %run_id, kind = request.kind());
    dispatch(root, json, run_id, request).instrument(span).await
}

async fn dispatch(root: &Path, json: bool, run_id: Uuid, request: Request) -> Result<()> {
    let start = Instant::now();
    tracing::debug!("start");

    if request == Request::Init {
        return init(root, json);
    }

    let ctx = Context {
        root: root.to_path_buf(),
        config: SsotConfig::load(root)?,
        json,
        run_id,
    };

    let result = match request {
        Request::Init => Ok(()),
        Request::Status => status(&ctx).await,
        Request::Query {
            question,
            category,
            topic,
            limit,
        } => query(&ctx, question, category, topic, limit).await,
        Request::Graph(view) => graph(&ctx, view).await,
        Request::Taxonomy(TaxonomyAction::Analyze) => taxonomy_analyze(&ctx).await,
        Request::Taxonomy(TaxonomyAction::Validate { file }) => {
            taxonomy_validate(&ctx, file.as_deref()).await
        }
        Request::Analyze(kind) => analyze(&ctx, kind).await,
    };

    tracing::debug!(duration_ms = start.elapsed().as_millis() as u64, "end");
    result
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn spinner(ctx: &Context, message: &'static str) -> Result<ProgressBar> {
    if ctx.json {
        return Ok(ProgressBar::hidden());
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message);
    Ok(spinner)
}

/// Loads the corpus on a blocking thread. Ctrl+C cancels the load.
async fn load(ctx: &Context, filter: CategoryFilter) -> Result<Corpus> {
    let spinner = spinner(ctx, "Loading documents...")?;
    let cancel = CancelFlag::new();

    let mut task = {
        let root = ctx.root.clone();
        let config = ctx.config.clone();
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || load_corpus(&root, filter, &config, &cancel))
    };

    let corpus = tokio::select! {
        joined = &mut task => joined??,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, cancelling load");
            cancel.cancel();
            spinner.finish_and_clear();
            // Wait for in-flight reads to stop before reporting.
            let _ = task.await;
            return Err(LoadError::Cancelled.into());
        }
    };
    spinner.finish_and_clear();

    if !ctx.json && !corpus.warnings.is_empty() {
        println!("{} {} files skipped:", "⚠".yellow(), corpus.warnings.len());
        for warning in corpus.warnings.iter().take(5) {
            println!("  {}", warning.to_string().red());
        }
        if corpus.warnings.len() > 5 {
            println!("  ... and {} more", corpus.warnings.len() - 5);
        }
    }

    Ok(corpus)
}

fn vocabulary(ctx: &Context) -> Result<Vocabulary> {
    Ok(Vocabulary::load(&ctx.root, &ctx.config)?)
}

fn print_list<T: std::fmt::Display>(items: &[T]) {
    for item in items.iter().take(LIST_LIMIT) {
        println!("  • {}", item);
    }
    if items.len() > LIST_LIMIT {
        println!("  ... and {} more", items.len() - LIST_LIMIT);
    }
}

/// Initialize SSOT Atlas in a repository.
fn init(root: &Path, json: bool) -> Result<()> {
    let config_path = SsotConfig::path_for(root);

    if config_path.exists() {
        if json {
            return print_json(&serde_json::json!({ "initialized": false, "config": config_path }));
        }
        println!("{} Already initialized", "✓".green());
        return Ok(());
    }

    let path = SsotConfig::default().save(root)?;

    if json {
        return print_json(&serde_json::json!({ "initialized": true, "config": path }));
    }
    println!("{} Initialized SSOT Atlas in {}", "✓".green(), root.display());
    println!("  Config written to {}", path.display().to_string().dimmed());
    println!("  Run {} to check the repository", "ssot analyze".cyan());
    Ok(())
}

#[derive(Serialize)]
struct StatusReport {
    root: PathBuf,
    documents: usize,
    by_category: BTreeMap<String, usize>,
    warnings: usize,
    taxonomy_terms: usize,
    corpus_hash: String,
    duration_ms: u64,
}

/// Show corpus statistics.
async fn status(ctx: &Context) -> Result<()> {
    let corpus = load(ctx, CategoryFilter::All).await?;
    let vocab = vocabulary(ctx)?;

    let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
    for doc in &corpus.documents {
        let key = doc
            .category
            .map(|c| c.to_string())
            .unwrap_or_else(|| "(uncategorized)".to_string());
        *by_category.entry(key).or_default() += 1;
    }

    let report = StatusReport {
        root: corpus.root.clone(),
        documents: corpus.len(),
        by_category,
        warnings: corpus.warnings.len(),
        taxonomy_terms: vocab.len(),
        corpus_hash: corpus.corpus_hash.clone(),
        duration_ms: corpus.duration_ms,
    };

    if ctx.json {
        return print_json(&report);
    }

    println!("{}", "SSOT Status".cyan().bold());
    println!();
    println!("  {} {}", "Root:".dimmed(), report.root.display());
    println!("  {} {}", "Documents:".dimmed(), report.documents);
    for (category, count) in &report.by_category {
        println!("    {} {}", format!("{category}:").dimmed(), count);
    }
    println!("  {} {}", "Warnings:".dimmed(), report.warnings);
    println!("  {} {}", "Taxonomy terms:".dimmed(), report.taxonomy_terms);
    println!("  {} {}", "Corpus hash:".dimmed(), &report.corpus_hash[..12.min(report.corpus_hash.len())]);
    println!("  {} {}ms", "Load time:".dimmed(), report.duration_ms);
    Ok(())
}

/// Search the repository.
async fn query(
    ctx: &Context,
    question: String,
    category: CategoryFilter,
    topic: Option<String>,
    limit: Option<usize>,
) -> Result<()> {
    let corpus = load(ctx, category).await?;
    let vocab = vocabulary(ctx)?;
    let index = TermIndex::build(&corpus.documents, &vocab);

    let mut query = Query::new(question).with_category(category);
    if let Some(topic) = topic {
        query = query.with_topic(topic);
    }
    let result = rank(
        &corpus.documents,
        &index,
        &query,
        limit.unwrap_or(ctx.config.max_results),
    );

    if ctx.json {
        return print_json(&result);
    }
    print_query_result(&result);
    Ok(())
}

fn print_query_result(result: &QueryResult) {
    if result.is_empty() {
        println!("{}", result.answer.yellow());
        return;
    }

    println!("{}", result.answer);
    println!();
    println!(
        "{} {:.2}",
        "Confidence:".dimmed(),
        result.confidence
    );
    println!("{}", "Sources:".cyan().bold());
    for hit in &result.results {
        println!(
            "  {} {} {}",
            format!("{:.3}", hit.score).yellow(),
            hit.path.cyan(),
            format!("({})", hit.section).dimmed()
        );
    }
}

async fn build_graph(ctx: &Context) -> Result<(Corpus, ReferenceGraph)> {
    let corpus = load(ctx, CategoryFilter::All).await?;
    let graph = ReferenceGraph::from_documents(&corpus.documents, &ctx.config);
    Ok((corpus, graph))
}

/// Inspect the reference graph.
async fn graph(ctx: &Context, view: GraphView) -> Result<()> {
    let (_, graph) = build_graph(ctx).await?;
    let report = CrossRefReport::from_graph(&graph);

    if ctx.json {
        return match view {
            GraphView::Orphans => print_json(&report.orphans),
            GraphView::Cycles => print_json(&serde_json::json!({
                "cycles": report.cycles,
                "truncated": report.cycles_truncated,
            })),
            GraphView::Dangling => print_json(&report.dangling),
            GraphView::All => print_json(&report),
        };
    }

    if view == GraphView::All {
        println!("{}", "Reference Graph".cyan().bold());
        println!("  {}", report.summary());
        println!();
    }

    if matches!(view, GraphView::Orphans | GraphView::All) {
        println!("{} ({})", "Orphans".yellow(), report.orphans.len());
        print_list(&report.orphans);
    }

    if matches!(view, GraphView::Cycles | GraphView::All) {
        let cycles: Vec<String> = report
            .cycles
            .iter()
            .map(|cycle| format!("{} → {}", cycle.join(" → "), cycle[0]))
            .collect();
        println!("{} ({})", "Cycles".yellow(), cycles.len());
        print_list(&cycles);
        if report.cycles_truncated {
            println!("  {}", "(enumeration stopped at max_cycles)".dimmed());
        }
    }

    if matches!(view, GraphView::Dangling | GraphView::All) {
        let dangling: Vec<String> = report
            .dangling
            .iter()
            .map(|edge| format!("{}:{} → {}", edge.source, edge.line, edge.target.red()))
            .collect();
        println!("{} ({})", "Broken links".yellow(), dangling.len());
        print_list(&dangling);
    }

    if view == GraphView::All {
        print_recommendations(&report.recommendations());
    }
    Ok(())
}

#[derive(Serialize)]
struct TaxonomyAnalysis {
    vocabulary_size: usize,
    term_usage: BTreeMap<String, usize>,
    undefined_terms: Vec<UndefinedTerm>,
    casing_issues: Vec<CasingIssue>,
    recommendations: Vec<String>,
}

fn analyze_terms(ctx: &Context, documents: &[Document], vocab: &Vocabulary) -> TaxonomyAnalysis {
    let index = TermIndex::build(documents, vocab);
    let analysis = TaxonomyAnalysis {
        vocabulary_size: vocab.len(),
        term_usage: index.term_usage(),
        undefined_terms: index.undefined_terms(ctx.config.undefined_term_threshold),
        casing_issues: index.casing_issues(),
        recommendations: index.usage_recommendations(),
    };
    tracing::info!(
        terms = analysis.term_usage.len(),
        undefined = analysis.undefined_terms.len(),
        "Term usage analyzed"
    );
    analysis
}

/// Report term usage against the taxonomy.
async fn taxonomy_analyze(ctx: &Context) -> Result<()> {
    let corpus = load(ctx, CategoryFilter::All).await?;
    let vocab = vocabulary(ctx)?;
    let analysis = analyze_terms(ctx, &corpus.documents, &vocab);

    if ctx.json {
        return print_json(&analysis);
    }

    println!("{}", "Taxonomy".cyan().bold());
    println!("  {} {}", "Vocabulary terms:".dimmed(), analysis.vocabulary_size);
    println!();

    let undefined: Vec<String> = analysis
        .undefined_terms
        .iter()
        .map(|t| format!("{} ({})", t.term, t.count))
        .collect();
    println!(
        "{} ({}, used at least {} times)",
        "Undefined terms".yellow(),
        undefined.len(),
        ctx.config.undefined_term_threshold
    );
    print_list(&undefined);

    let casing: Vec<String> = analysis
        .casing_issues
        .iter()
        .map(|issue| {
            let variants: Vec<String> = issue
                .variants
                .iter()
                .map(|(form, count)| format!("{form}({count})"))
                .collect();
            format!("{} should be {}: {}", issue.term, issue.canonical.green(), variants.join(", "))
        })
        .collect();
    println!("{} ({})", "Inconsistent casing".yellow(), casing.len());
    print_list(&casing);

    print_recommendations(&analysis.recommendations);
    Ok(())
}

/// Validate front matter tags.
async fn taxonomy_validate(ctx: &Context, file: Option<&Path>) -> Result<()> {
    let vocab = vocabulary(ctx)?;

    let report: Vec<DocumentIssues> = match file {
        Some(file) => {
            let text = fs::read_to_string(file)?;
            let doc = Document::parse(file.to_string_lossy(), text);
            let issues = validate_tags(&doc.tags(), &vocab);
            if issues.is_empty() {
                Vec::new()
            } else {
                vec![DocumentIssues {
                    path: doc.path,
                    issues,
                }]
            }
        }
        None => {
            let corpus = load(ctx, CategoryFilter::All).await?;
            validate_corpus_tags(&corpus.documents, &vocab)
        }
    };
    tracing::info!(documents_with_issues = report.len(), "Validation complete");

    if ctx.json {
        return print_json(&serde_json::json!({
            "passed": report.is_empty(),
            "documents": report,
        }));
    }

    if report.is_empty() {
        println!("{} All tags are in the controlled vocabulary", "✓".green());
        return Ok(());
    }

    for doc in &report {
        println!("{}", doc.path.cyan());
        for issue in &doc.issues {
            print!("  {} {}", "✗".red(), issue.message);
            if !issue.suggestions.is_empty() {
                print!(" {}", format!("(did you mean {}?)", issue.suggestions.join(", ")).dimmed());
            }
            println!();
        }
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(tag = "analysis", rename_all = "snake_case")]
enum Finding {
    Crossref {
        orphan_count: usize,
        sample_orphans: Vec<String>,
        cycle_count: usize,
        sample_cycles: Vec<Vec<String>>,
        dangling_count: usize,
    },
    Taxonomy {
        unused_terms: Vec<String>,
        frequent_terms: Vec<(String, usize)>,
        undefined_terms: Vec<UndefinedTerm>,
    },
}

#[derive(Serialize)]
struct AnalysisMetadata {
    run_id: String,
    timestamp: String,
    documents: usize,
    corpus_hash: String,
    duration_ms: u64,
}

#[derive(Serialize)]
struct AnalysisReport {
    #[serde(rename = "type")]
    kind: AnalysisKind,
    findings: Vec<Finding>,
    recommendations: Vec<String>,
    metadata: AnalysisMetadata,
}

/// Run a combined analysis.
async fn analyze(ctx: &Context, kind: AnalysisKind) -> Result<()> {
    let start = Instant::now();
    let corpus = load(ctx, CategoryFilter::All).await?;
    let mut findings = Vec::new();
    let mut recommendations = Vec::new();

    if kind.includes_crossref() {
        let graph = ReferenceGraph::from_documents(&corpus.documents, &ctx.config);
        let report = CrossRefReport::from_graph(&graph);
        findings.push(Finding::Crossref {
            orphan_count: report.orphans.len(),
            sample_orphans: report.orphans.iter().take(SAMPLE_ORPHANS).cloned().collect(),
            cycle_count: report.cycles.len(),
            sample_cycles: report.cycles.iter().take(SAMPLE_CYCLES).cloned().collect(),
            dangling_count: report.dangling.len(),
        });
        // The orphan analysis leaves out the cycle hint.
        recommendations.extend(
            report
                .recommendations()
                .into_iter()
                .filter(|r| kind != AnalysisKind::Orphans || !r.starts_with("Resolve")),
        );
    }

    if kind.includes_taxonomy() {
        let vocab = vocabulary(ctx)?;
        let analysis = analyze_terms(ctx, &corpus.documents, &vocab);

        let mut frequent: Vec<(String, usize)> = analysis
            .term_usage
            .iter()
            .map(|(term, count)| (term.clone(), *count))
            .collect();
        frequent.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        frequent.truncate(SAMPLE_TERMS);

        findings.push(Finding::Taxonomy {
            unused_terms: analysis
                .term_usage
                .iter()
                .filter(|(_, count)| **count == 0)
                .map(|(term, _)| term.clone())
                .take(SAMPLE_TERMS)
                .collect(),
            frequent_terms: frequent,
            undefined_terms: analysis.undefined_terms,
        });
        recommendations.extend(analysis.recommendations);
    }

    let report = AnalysisReport {
        kind,
        findings,
        recommendations,
        metadata: AnalysisMetadata {
            run_id: ctx.run_id.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            documents: corpus.len(),
            corpus_hash: corpus.corpus_hash.clone(),
            duration_ms: start.elapsed().as_millis() as u64,
        },
    };

    if ctx.json {
        return print_json(&report);
    }

    println!("{}", "Analysis Report".cyan().bold());
    println!(
        "  {} documents analyzed in {}ms",
        report.metadata.documents, report.metadata.duration_ms
    );
    println!();
    for finding in &report.findings {
        match finding {
            Finding::Crossref {
                orphan_count,
                cycle_count,
                dangling_count,
                ..
            } => {
                println!(
                    "  {} {} orphans, {} cycles, {} broken links",
                    "Cross-references:".dimmed(),
                    orphan_count,
                    cycle_count,
                    dangling_count
                );
            }
            Finding::Taxonomy {
                unused_terms,
                undefined_terms,
                ..
            } => {
                println!(
                    "  {} {} unused shown, {} undefined",
                    "Taxonomy:".dimmed(),
                    unused_terms.len(),
                    undefined_terms.len()
                );
            }
        }
    }
    print_recommendations(&report.recommendations);
    Ok(())
}

fn print_recommendations(recommendations: &[String]) {
    println!();
    if recommendations.is_empty() {
        println!("{} Nothing to fix", "✓".green());
        return;
    }
    println!("{}", "Recommendations".cyan().bold());
    for recommendation in recommendations {
        println!("  → {}", recommendation);
    }
}
