use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use std::time::Duration;
use visionprobe_common::{logger, validate_base_url, AppConfig};
use visionprobe_llm::{OllamaClient, VISUAL_BREAKDOWN_PROMPT};
use visionprobe_vision::{AnalysisOptions, ImageInput, MultiRunAnalyzer, RunCount, TesseractOcr};

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    if let Some(root) = find_project_root() {
        let env_path = root.join(".env");
        if env_path.exists() {
            dotenv::from_path(&env_path).ok();
        }
    } else {
        dotenv::dotenv().ok();
    }
}

#[derive(Parser)]
#[command(name = "visionprobe")]
#[command(about = "VisionProbe - local UI for Ollama image analysis, completion and model pulls", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the browser UI server
    Serve {
        /// Host to bind to (defaults to this machine's hostname)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,

        /// Do not open the UI in a web browser
        #[arg(long)]
        no_browser: bool,
    },

    /// Analyze an image several times and print the report
    Analyze {
        /// Image file
        image: PathBuf,

        /// Number of analysis runs (1-10)
        #[arg(long)]
        runs: Option<u32>,

        /// Prepend Tesseract OCR text
        #[arg(long)]
        ocr: bool,

        /// Ollama server URL
        #[arg(long)]
        url: Option<String>,

        /// Model name
        #[arg(long)]
        model: Option<String>,
    },

    /// Stream a text completion to stdout
    Complete {
        /// Prompt text
        prompt: String,

        /// Ollama server URL
        #[arg(long)]
        url: Option<String>,

        /// Model name
        #[arg(long)]
        model: Option<String>,
    },

    /// Pull a model onto the Ollama server
    Pull {
        /// Model name (defaults to the configured model)
        model: Option<String>,

        /// Ollama server URL
        #[arg(long)]
        url: Option<String>,
    },
}

/// Apply per-command server and model overrides
fn with_overrides(mut config: AppConfig, url: Option<String>, model: Option<String>) -> Result<AppConfig> {
    if let Some(url) = url {
        validate_base_url(&url)?;
        config.ollama_base_url = url;
    }
    if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
        config.model = model;
    }
    Ok(config)
}

fn client(config: &AppConfig) -> visionprobe_common::Result<OllamaClient> {
    OllamaClient::with_timeout(&config.ollama_base_url, config.request_timeout())
}

/// Print an operation's display text; failures go to stderr with exit code 1
fn finish(outcome: visionprobe_common::Result<String>) {
    match outcome {
        Ok(text) => println!("{}", text.trim_end()),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

async fn run_analyze(
    config: AppConfig,
    image: PathBuf,
    runs: Option<u32>,
    ocr: bool,
) -> visionprobe_common::Result<String> {
    let runs = RunCount::new(runs.unwrap_or(config.default_runs))?;
    let image = ImageInput::load(image).await?;

    let prompt = config
        .analysis_prompt
        .clone()
        .unwrap_or_else(|| VISUAL_BREAKDOWN_PROMPT.to_string());
    let engine = TesseractOcr::new(&config.tesseract_path, &config.ocr_language);
    let analyzer = MultiRunAnalyzer::new(client(&config)?, engine).with_prompt(prompt);

    let options = AnalysisOptions {
        runs,
        ocr,
        max_tokens: config.max_tokens,
        ..AnalysisOptions::new(&config.model)
    };

    let report = analyzer.analyze(&image, &options).await?;
    Ok(report.render())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env early so CLI overrides below win over it
    load_dotenv_from_project_root();

    match cli.command {
        Some(Commands::Serve {
            host,
            port,
            no_browser,
        }) => {
            if let Some(host) = &host {
                std::env::set_var("SERVER_HOST", host);
            }
            if let Some(port) = port {
                std::env::set_var("SERVER_PORT", port.to_string());
            }
            serve(AppConfig::from_env()?, !no_browser).await?;
        }
        Some(Commands::Analyze {
            image,
            runs,
            ocr,
            url,
            model,
        }) => {
            let config = with_overrides(AppConfig::from_env()?, url, model)?;
            logger::setup_console_logging(&config.log_level)?;

            finish(run_analyze(config, image, runs, ocr).await);
        }
        Some(Commands::Complete { prompt, url, model }) => {
            let config = with_overrides(AppConfig::from_env()?, url, model)?;
            logger::setup_console_logging(&config.log_level)?;

            let request = visionprobe_llm::GenerateRequest::text(&config.model, &prompt)
                .with_max_tokens(config.max_tokens);
            let outcome = client(&config)?
                .generate_with_progress(request, |fragment| {
                    print!("{}", fragment);
                    std::io::stdout().flush().ok();
                })
                .await;

            match outcome {
                Ok(_) => println!(),
                Err(e) => {
                    println!();
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Pull { model, url }) => {
            let config = with_overrides(AppConfig::from_env()?, url, model)?;
            logger::setup_console_logging(&config.log_level)?;

            let pb = ProgressBar::new_spinner();
            pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} [{elapsed_precise}] {msg}")?);
            pb.enable_steady_tick(Duration::from_millis(120));
            pb.set_message(format!("Pulling {}", config.model));

            let outcome = client(&config)?
                .pull_with_progress(&config.model, |status| pb.set_message(status.to_string()))
                .await;
            pb.finish_and_clear();

            finish(outcome);
        }
        None => serve(AppConfig::from_env()?, true).await?,
    }

    Ok(())
}

/// Address a browser should use for the bound UI
fn browser_url(bind_addr: &str) -> String {
    match bind_addr.rsplit_once(':') {
        Some(("0.0.0.0", port)) | Some(("[::]", port)) => format!("http://localhost:{}/", port),
        _ => format!("http://{}/", bind_addr),
    }
}

/// Launch the platform's default browser; failures are only logged
fn open_browser(url: &str) {
    let mut command = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", "", url]);
        c
    } else if cfg!(target_os = "macos") {
        let mut c = Command::new("open");
        c.arg(url);
        c
    } else {
        let mut c = Command::new("xdg-open");
        c.arg(url);
        c
    };

    match command.stdout(Stdio::null()).stderr(Stdio::null()).spawn() {
        Ok(_) => tracing::info!("Opened {} in browser", url),
        Err(e) => tracing::warn!("Could not open browser for {}: {}", url, e),
    }
}

async fn serve(config: AppConfig, launch_browser: bool) -> Result<()> {
    logger::setup_logging(&config.log_dir, &config.log_level)?;

    tracing::info!("VisionProbe starting...");
    tracing::info!("  Ollama: {}", config.ollama_base_url);
    tracing::info!("  Model: {}", config.model);

    let bind_addr = config.server_bind_address();
    let server = visionprobe_server::bind_server(config)?;
    println!("Server listening on http://{}", bind_addr);

    if launch_browser {
        open_browser(&browser_url(&bind_addr));
    }

    server.await?;
    tracing::info!("UI server stopped");
    Ok(())
}
