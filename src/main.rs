// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! SecondLook: buy-or-pass advice for secondhand furniture
//!
//! Command-line front end. Runs the HTTP API, or walks the same
//! capture -> analyze -> answer -> results flow against a local session file.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use secondlook::advisor::{Advisor, AnalyzeRequest, QuestionsRequest, ReasoningRequest};
use secondlook::assessment::{AnalysisResult, QuestionAnswer};
use secondlook::config::AppConfig;
use secondlook::openai::OpenAiClient;
use secondlook::photo;
use secondlook::prompts::InsightSummary;
use secondlook::session::{Session, SessionStore};
use secondlook::{Result, SecondLookError};

/// SecondLook CLI - secondhand furniture advisor
#[derive(Parser, Debug)]
#[command(name = "secondlook")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "1.0.0")]
#[command(about = "AI-assisted buy/pass advice for secondhand furniture", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Analyze an item from photos, starting a new session
    Analyze {
        /// Photo files (first 3 are used)
        #[arg(required = true)]
        photos: Vec<PathBuf>,

        /// Asking price in dollars
        #[arg(long)]
        price: Option<String>,

        /// Notes about the item
        #[arg(long)]
        notes: Option<String>,
    },

    /// Ask for fresh follow-up questions for the current analysis
    Questions,

    /// Explain how an insight of the current analysis was reached
    Reason {
        /// Insight label (e.g. "Age")
        label: String,
    },

    /// Answer a follow-up question
    Answer {
        /// Question id (e.g. q1)
        question_id: String,

        /// Text answer
        #[arg(long, conflicts_with = "photo", required_unless_present = "photo")]
        text: Option<String>,

        /// Photo answer
        #[arg(long)]
        photo: Option<PathBuf>,
    },

    /// Show the current analysis with recalculated confidence
    Results,

    /// Session operations
    Session {
        #[command(subcommand)]
        action: SessionCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show model API status
    Status,
}

#[derive(Subcommand, Debug)]
enum SessionCommands {
    /// Show the stored session
    Show,

    /// Discard the stored session
    Clear,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = AppConfig::load(&cli.config)?;
    let json = cli.format == "json";

    match cli.command {
        Commands::Serve { host, port } => run_serve(config, host, port).await,
        Commands::Analyze { photos, price, notes } => {
            run_analyze(config, photos, price.unwrap_or_default(), notes.unwrap_or_default(), json).await
        }
        Commands::Questions => run_questions(config, json).await,
        Commands::Reason { label } => run_reason(config, label, json).await,
        Commands::Answer { question_id, text, photo } => {
            run_answer(config, question_id, text, photo, json)
        }
        Commands::Results => run_results(config, json),
        Commands::Session { action } => run_session_command(config, action, json),
        Commands::Config { action } => run_config_command(config, action, &cli.config),
        Commands::Status => run_status(config).await,
    }
}

fn session_store(config: &AppConfig) -> SessionStore {
    SessionStore::new(PathBuf::from(&config.session.path))
}

fn require_analysis(session: &Session) -> Result<&AnalysisResult> {
    session.analysis.as_ref().ok_or_else(|| {
        SecondLookError::Session("No analysis yet. Run `secondlook analyze <photos>` first".to_string())
    })
}

/// Run the HTTP API
async fn run_serve(mut config: AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.web.host = host;
    }
    if let Some(port) = port {
        config.web.port = port;
    }
    secondlook::web::start_server(config).await
}

/// Analyze photos and start a new session
async fn run_analyze(
    config: AppConfig,
    paths: Vec<PathBuf>,
    price: String,
    notes: String,
    json: bool,
) -> Result<()> {
    let advisor = Advisor::require(&config)?;

    let photos = paths
        .iter()
        .take(config.limits.max_photos)
        .map(|p| photo::encode_file(p))
        .collect::<Result<Vec<_>>>()?;
    if paths.len() > photos.len() {
        info!("Using the first {} of {} photos", photos.len(), paths.len());
    }

    let mut session = Session::new();
    session.set_photos(photos, config.limits.max_photos);
    session.price = price;
    session.notes = notes;

    info!("Analyzing {} photo(s)...", session.photos.len());
    let request = AnalyzeRequest {
        photos: session.photos.clone(),
        price: session.price.clone(),
        notes: session.notes.clone(),
    };
    let analysis = advisor.analyze_item(&request).await?;
    session.set_analysis(analysis);

    let store = session_store(&config);
    store.save(&mut session)?;
    debug!("Session saved to {:?}", store.path());

    print_results(&session, json)
}

/// Replace the current analysis' questions with freshly generated ones
async fn run_questions(config: AppConfig, json: bool) -> Result<()> {
    let store = session_store(&config);
    let mut session = store.load()?;
    let analysis = require_analysis(&session)?;

    let insights_needing_help: Vec<InsightSummary> = analysis
        .insights_needing_help()
        .into_iter()
        .map(|i| InsightSummary {
            label: i.label.clone(),
            value: i.value.clone(),
            confidence: i.confidence,
        })
        .collect();

    let request = QuestionsRequest {
        insights_needing_help,
        photos: session.photos.clone(),
        price: session.price.clone(),
        notes: session.notes.clone(),
        overall_analysis: Some(serde_json::to_value(analysis)?),
    };

    let questions = Advisor::require(&config)?.generate_questions(&request).await?;

    if let Some(analysis) = session.analysis.as_mut() {
        analysis.questions = Some(questions.clone());
    }
    session.answers.clear();
    store.save(&mut session)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&questions)?);
    } else if questions.is_empty() {
        println!("Every insight is already High confidence; no questions needed.");
    } else {
        for q in &questions {
            println!("[{}] {} ({}; helps {})", q.id, q.text, q.answer_type, q.helps_insights.join(", "));
        }
    }
    Ok(())
}

/// Explain one insight and store the explanation in the session
async fn run_reason(config: AppConfig, label: String, json: bool) -> Result<()> {
    let store = session_store(&config);
    let mut session = store.load()?;
    let analysis = require_analysis(&session)?;

    let insight = analysis
        .insights
        .iter()
        .find(|i| i.label.eq_ignore_ascii_case(&label))
        .ok_or_else(|| SecondLookError::InvalidRequest(format!("No insight labelled '{}'", label)))?;

    let request = ReasoningRequest {
        label: insight.label.clone(),
        value: insight.value.clone(),
        confidence: insight.confidence.to_string(),
    };
    let reasoning = Advisor::require(&config)?.generate_reasoning(&request).await?;

    if let Some(insight) = session
        .analysis
        .as_mut()
        .and_then(|a| a.insights.iter_mut().find(|i| i.label == request.label))
    {
        insight.reasoning = reasoning.clone();
    }
    store.save(&mut session)?;

    if json {
        println!("{}", serde_json::json!({ "reasoning": reasoning }));
    } else {
        println!("{}: {}", request.label, reasoning);
    }
    Ok(())
}

/// Record an answer and show the recalculated tiers
fn run_answer(
    config: AppConfig,
    question_id: String,
    text: Option<String>,
    photo_path: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let store = session_store(&config);
    let mut session = store.load()?;
    let analysis = require_analysis(&session)?;

    let question = analysis
        .questions
        .iter()
        .flatten()
        .find(|q| q.id == question_id)
        .ok_or_else(|| SecondLookError::InvalidRequest(format!("Unknown question '{}'", question_id)))?;
    let helps = question.helps_insights.clone();

    let answer = match (text, photo_path) {
        (_, Some(path)) => QuestionAnswer::photo(&question_id, helps, photo::encode_file(&path)?),
        (Some(text), None) => QuestionAnswer::text(&question_id, helps, text),
        (None, None) => {
            return Err(SecondLookError::InvalidRequest("Provide --text or --photo".to_string()))
        }
    };

    session.record_answer(answer);
    store.save(&mut session)?;
    info!("Recorded answer to {}", question_id);

    print_results(&session, json)
}

/// Show the current session's results
fn run_results(config: AppConfig, json: bool) -> Result<()> {
    let session = session_store(&config).load()?;
    require_analysis(&session)?;
    print_results(&session, json)
}

fn print_results(session: &Session, json: bool) -> Result<()> {
    let Some(overlay) = session.overlay() else {
        return Err(SecondLookError::Session("No analysis in session".to_string()));
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&overlay)?);
        return Ok(());
    }

    let result = &overlay.analysis;
    let verdict = result.verdict();

    println!("{}", result.title);
    if !session.price.is_empty() {
        println!("Asking price: ${}", session.price);
    }
    println!();
    println!("[{}] {}", verdict, result.recommendation.headline);
    println!("  {}", result.recommendation.subhead);
    println!("  Confidence: {}", result.recommendation.confidence);
    for chip in &result.recommendation.chips {
        println!("  * {}", chip);
    }

    println!();
    for insight in &result.insights {
        let marker = if overlay.updates.contains_key(&insight.label) { " (updated)" } else { "" };
        println!("{:<20} {:<30} {}{}", insight.label, insight.value, insight.confidence, marker);
        println!("    {}", insight.reasoning);
    }

    println!();
    println!(
        "Fair value: ${:.0} - ${:.0}",
        result.fair_value_range[0], result.fair_value_range[1]
    );
    println!(
        "Est. savings: ${:.0} - ${:.0}",
        result.est_savings_range[0], result.est_savings_range[1]
    );
    if let Some(reasoning) = &result.savings_reasoning {
        println!("    {}", reasoning);
    }

    let open: Vec<_> = result
        .questions
        .iter()
        .flatten()
        .filter(|q| !session.is_answered(&q.id))
        .collect();
    if !open.is_empty() {
        println!();
        println!("Questions that would sharpen this:");
        for q in open {
            println!("  [{}] {} (answer with --{})", q.id, q.text, q.answer_type);
        }
    }

    Ok(())
}

/// Run session commands
fn run_session_command(config: AppConfig, action: SessionCommands, json: bool) -> Result<()> {
    let store = session_store(&config);

    match action {
        SessionCommands::Show => {
            let session = store.load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&session)?);
            } else {
                println!("Session {} ({:?})", session.id, store.path());
                println!("  Updated: {}", session.updated_at.format("%Y-%m-%d %H:%M"));
                println!("  Photos: {}", session.photos.len());
                println!("  Price: {}", if session.price.is_empty() { "-" } else { session.price.as_str() });
                println!("  Notes: {}", if session.notes.is_empty() { "-" } else { session.notes.as_str() });
                println!(
                    "  Analysis: {}",
                    session.analysis.as_ref().map(|a| a.title.as_str()).unwrap_or("-")
                );
                println!("  Answers: {}", session.answered().len());
            }
        }
        SessionCommands::Clear => {
            store.clear()?;
            println!("Session cleared");
        }
    }

    Ok(())
}

/// Run config commands
fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            println!("Configuration at {:?} is valid", config_path);
            println!("  API: {}", config.ai_engine.url);
            println!("  Model: {}", config.ai_engine.model);
            println!("  Max photos: {}", config.limits.max_photos);
            println!("  Session file: {}", config.session.path);
        }
    }

    Ok(())
}

/// Run status check
async fn run_status(config: AppConfig) -> Result<()> {
    println!("SecondLook v1.0.0 Status");
    println!("========================");
    println!("API: {}", config.ai_engine.url);
    println!("Model: {}", config.ai_engine.model);

    let Some(api_key) = config.api_key() else {
        println!("{}: not set", config.ai_engine.api_key_env);
        return Ok(());
    };
    println!("{}: set", config.ai_engine.api_key_env);

    let client = OpenAiClient::new(&config.ai_engine, api_key)?;
    match client.list_models().await {
        Ok(models) => {
            let available = models.iter().any(|m| m == client.model());
            println!(
                "Model API: reachable ({} models, '{}' {})",
                models.len(),
                client.model(),
                if available { "available" } else { "not listed" }
            );
        }
        Err(e) => println!("Model API: error - {}", e),
    }

    Ok(())
}
