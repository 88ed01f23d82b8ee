mod serve;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use slidedeck_core::files::extract_all;
use slidedeck_core::llm::Provider;
use slidedeck_core::{
    Config, ExecutionOrchestrator, PlanGenerator, ResearchPlan, SlideDeck, Stage, TemplateAnalysis,
    TemplateRegistry,
};

use serve::ServeConfig;

#[derive(Parser)]
#[command(name = "slidedeck")]
#[command(about = "Generate PowerPoint decks from a topic with an LLM", long_about = None, version)]
struct Cli {
    /// Config file to use instead of the default locations
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a deck in one shot from a topic
    Generate {
        /// What the presentation is about
        #[arg(long)]
        topic: String,
        /// Model as `[provider]model`, e.g. `[openai]gpt-4o-mini`
        #[arg(long)]
        model: Option<String>,
        /// Template name
        #[arg(long)]
        template: Option<String>,
        #[arg(long, default_value = "output/deck.pptx")]
        output_path: PathBuf,
        /// Source files whose text is added to the prompt
        #[arg(long)]
        file: Vec<PathBuf>,
    },
    /// Create a research plan and save it for review
    Plan {
        #[arg(long)]
        query: String,
        #[arg(long)]
        template: Option<String>,
        #[arg(long)]
        num_sections: Option<usize>,
        /// `normal` or `deep`
        #[arg(long)]
        search_mode: Option<String>,
        #[arg(long)]
        file: Vec<PathBuf>,
        #[arg(long, default_value = "plan.yaml")]
        output: PathBuf,
    },
    /// Execute a saved plan into a deck
    Execute {
        #[arg(long)]
        plan: PathBuf,
        /// Template the plan was made for
        #[arg(long)]
        template: Option<String>,
        /// Source files searches are answered from
        #[arg(long)]
        file: Vec<PathBuf>,
        #[arg(long)]
        output_path: Option<PathBuf>,
    },
    /// Analyze template layouts and write the analysis as JSON
    Analyze {
        /// Analyze one template instead of all of them
        #[arg(long)]
        template: Option<String>,
        #[arg(long, default_value = "analysis.json")]
        output: PathBuf,
    },
    /// List configured templates
    Templates,
    /// Start the web UI and API
    Serve {
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        host: Option<String>,
        /// Open the browser once the server is up
        #[arg(long)]
        open: bool,
    },
    /// Print the default configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("slidedeck=info,slidedeck_core=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Commands::Config = cli.command {
        print!("{}", Config::default_config_string());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .wrap_err_with(|| format!("loading config from {}", path.display()))?,
        None => Config::load().wrap_err("loading config")?,
    };
    let registry = TemplateRegistry::new(config.templates.clone());

    match cli.command {
        Commands::Generate {
            topic,
            model,
            template,
            output_path,
            file,
        } => generate(&config, registry, &topic, model, template, &output_path, &file).await,
        Commands::Plan {
            query,
            template,
            num_sections,
            search_mode,
            file,
            output,
        } => {
            let template = template.unwrap_or_else(|| registry.default_name().to_string());
            plan(&config, &registry, &query, &template, num_sections, search_mode, &file, &output).await
        }
        Commands::Execute {
            plan,
            template,
            file,
            output_path,
        } => {
            let template = template.unwrap_or_else(|| registry.default_name().to_string());
            execute(&config, &registry, &plan, &template, &file, output_path).await
        }
        Commands::Analyze { template, output } => analyze(&registry, template.as_deref(), &output),
        Commands::Templates => {
            list_templates(&registry);
            Ok(())
        }
        Commands::Serve { port, host, open } => {
            let serve = ServeConfig {
                host: host.unwrap_or_else(|| config.server.host.clone()),
                port: port.unwrap_or(config.server.port),
                open_browser: open || config.server.open_browser,
            };
            serve::start_server(config, serve).await
        }
        Commands::Config => Ok(()),
    }
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

/// Reads upload files and joins their text.
fn read_sources(files: &[PathBuf]) -> Result<Option<String>> {
    if files.is_empty() {
        return Ok(None);
    }
    let mut loaded = Vec::with_capacity(files.len());
    for path in files {
        let bytes = std::fs::read(path).wrap_err_with(|| format!("reading {}", path.display()))?;
        loaded.push((path.to_string_lossy().into_owned(), bytes));
    }
    let text = extract_all(loaded.iter().map(|(n, b)| (n.as_str(), b.as_slice())))?;
    info!(files = files.len(), chars = text.len(), "source files read");
    Ok(Some(text).filter(|t| !t.is_empty()))
}

async fn generate(
    config: &Config,
    registry: TemplateRegistry,
    topic: &str,
    model: Option<String>,
    template: Option<String>,
    output_path: &Path,
    files: &[PathBuf],
) -> Result<()> {
    let template_idx = match template.as_deref() {
        Some(name) => {
            let entry = registry.resolve(name)?;
            registry.list().iter().position(|e| e.name == entry.name).unwrap_or(0)
        }
        None => 0,
    };
    let additional = read_sources(files)?;

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let mut deck = SlideDeck::from_config(topic, config.llm.clone(), registry)?
        .with_additional_info(additional)
        .with_stream(tx);
    if let Some(name) = model.as_deref() {
        deck.set_model(name, None)?;
    }
    deck.set_template(template_idx);

    let pb = spinner(&format!("Generating with {}", deck.model()))?;
    let progress = pb.clone();
    let ticker = tokio::spawn(async move {
        let mut received = 0usize;
        while let Some(chunk) = rx.recv().await {
            received += chunk.len();
            progress.set_message(format!("Generating ({received} chars received)"));
        }
    });

    let result = deck.generate(output_path).await;
    drop(deck);
    let _ = ticker.await;
    pb.finish_and_clear();

    let headers = result?;
    println!("Deck written to {}", output_path.display());
    for (i, header) in headers.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, header);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn plan(
    config: &Config,
    registry: &TemplateRegistry,
    query: &str,
    template: &str,
    num_sections: Option<usize>,
    search_mode: Option<String>,
    files: &[PathBuf],
    output: &Path,
) -> Result<()> {
    let template = registry.load(template)?;
    let analysis = TemplateAnalysis::analyze(&template);
    info!("\n{}", analysis.summary_report());
    let source = read_sources(files)?;

    let mut planning = config.planning.clone();
    if let Some(mode) = search_mode {
        planning.search_mode = mode;
    }
    let llm = Provider::from_config(&config.llm).build()?;
    let generator = PlanGenerator::new(llm, planning);

    let pb = spinner("Planning sections")?;
    let result = generator
        .generate_plan(query, &analysis, num_sections, source.as_deref())
        .await;
    pb.finish_and_clear();
    let plan = result?;

    let yaml = plan.to_yaml()?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, yaml).wrap_err_with(|| format!("writing {}", output.display()))?;

    println!("Plan for \"{}\" written to {}", plan.query, output.display());
    for (i, section) in plan.sections.iter().enumerate() {
        println!(
            "  {:>2}. {} [{} / layout {}] {} queries",
            i + 1,
            section.section_title,
            section.enforced_content_type,
            section.layout_idx,
            section.total_search_queries
        );
    }
    println!("Total search queries: {}", plan.total_queries);
    Ok(())
}

async fn execute(
    config: &Config,
    registry: &TemplateRegistry,
    plan_path: &Path,
    template: &str,
    files: &[PathBuf],
    output_path: Option<PathBuf>,
) -> Result<()> {
    let yaml = std::fs::read_to_string(plan_path)
        .wrap_err_with(|| format!("reading {}", plan_path.display()))?;
    let plan = ResearchPlan::from_yaml(&yaml)?;
    if plan.sections.is_empty() {
        return Err(eyre!("plan {} has no sections", plan_path.display()));
    }
    let source = read_sources(files)?;
    let output_path = output_path.unwrap_or_else(|| {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        PathBuf::from(&config.execution.output_dir).join(format!("report_{stamp}.pptx"))
    });

    let template = registry.load(template)?;
    let llm = Provider::content_from_config(&config.llm).build()?;
    let (tx, mut rx) = mpsc::unbounded_channel::<Stage>();
    let orchestrator = ExecutionOrchestrator::new(llm, template, &config.execution)
        .with_source(source.as_deref())
        .with_progress(tx);

    let pb = spinner(Stage::Analyzing.message())?;
    let progress = pb.clone();
    let watcher = tokio::spawn(async move {
        while let Some(stage) = rx.recv().await {
            progress.set_message(stage.message());
        }
    });

    let result = orchestrator.execute_plan(&plan, &output_path).await;
    drop(orchestrator);
    let _ = watcher.await;
    pb.finish_and_clear();
    let report = result?;

    let failed = report.slides.iter().filter(|s| s.is_failed()).count();
    println!(
        "Deck written to {} ({} slides in {:.1}s)",
        report.output_path.display(),
        report.slides_generated,
        report.execution_time
    );
    println!("Execution log: {}", report.log_path.display());
    if failed > 0 {
        println!("{failed} section(s) failed; see the execution log");
    }
    Ok(())
}

fn analyze(registry: &TemplateRegistry, template: Option<&str>, output: &Path) -> Result<()> {
    match template {
        Some(name) => {
            let entry = registry.resolve(name)?;
            let template = registry.load_entry(entry)?;
            let analysis = TemplateAnalysis::analyze(&template);
            println!("{}", analysis.summary_report());
            let mut all = std::collections::BTreeMap::new();
            all.insert(entry.name.clone(), analysis.export_analysis());
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(output, serde_json::to_string_pretty(&all)?)
                .wrap_err_with(|| format!("writing {}", output.display()))?;
        }
        None => {
            let count = registry.write_analysis(output)?;
            println!("Analyzed {count} template(s)");
        }
    }
    println!("Analysis written to {}", output.display());
    Ok(())
}

fn list_templates(registry: &TemplateRegistry) {
    println!("Templates (default: {})", registry.default_name());
    for entry in registry.list() {
        let path = registry.path_for(entry);
        let status = if path.exists() { "" } else { " (missing, built-in layouts)" };
        println!("  {:<16} {}{}", entry.name, path.display(), status);
        if !entry.caption.is_empty() {
            println!("  {:<16} {}", "", entry.caption);
        }
    }
}
