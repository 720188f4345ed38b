use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use tracing::warn;

use glance::app::{App, Session, Settings};
use glance::auth::{self, AuthStorage};
use glance::banner::{BannerInfo, print_banner, print_session_summary};
use glance::commands::{CommandRegistry, CommandResult, SessionInfo, catalog, shared_input};
use glance::consts::{DEFAULT_MODELS_DIR, default_db_path, default_output_dir};
use glance::detect::ModelVersion;
use glance::detect::cache::DetectorCache;
use glance::detect::onnx::OnnxLoader;
use glance::explain::groq::GroqExplainer;
use glance::explain::{DetailLevel, Language, TextModel};
use glance::logging;

#[derive(Parser)]
#[command(
    name = "glance",
    version,
    about = "Explain code with a hosted LLM and spot postures with YOLO."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Explanation model
    #[arg(short, long, global = true, value_enum, default_value_t)]
    model: TextModel,

    /// How much explanation to ask for
    #[arg(long, global = true, value_enum, default_value_t)]
    detail: DetailLevel,

    /// Force the language hint instead of inferring it from the file
    #[arg(short, long, global = true, value_enum)]
    language: Option<Language>,

    /// Posture detector version
    #[arg(long, global = true, value_enum, default_value_t)]
    detector: ModelVersion,

    /// Directory holding yolov1x/best.onnx weight files
    #[arg(long, global = true, env = "GLANCE_MODELS_DIR", default_value = DEFAULT_MODELS_DIR)]
    models_dir: PathBuf,

    /// Where annotated images are written (default: system temp dir)
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Chat-completion API root
    #[arg(long, global = true, env = "GROQ_BASE_URL")]
    base_url: Option<String>,

    /// SQLite database for stored credentials (default: ~/.glance/glance.db)
    #[arg(long, global = true)]
    db: Option<String>,

    /// More logging on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Explain a code file, or code read from stdin
    Explain {
        /// Code file to explain
        file: Option<PathBuf>,
    },
    /// Detect postures in a jpg or png image
    Detect {
        /// Image to run the detector on
        image: PathBuf,

        /// Open the annotated image when done
        #[arg(long)]
        open: bool,
    },
    /// List explanation models and posture detectors
    Models,
    /// Store a Groq API key
    Login,
    /// Remove the stored API key
    Logout,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            model: self.model,
            detail: self.detail,
            language: self.language,
            detector: self.detector,
        }
    }

    fn db_path(&self) -> String {
        self.db
            .clone()
            .unwrap_or_else(|| default_db_path().to_string_lossy().into_owned())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let mut cli = Cli::parse();
    logging::init(cli.verbose);

    let db = cli.db_path();
    let settings = cli.settings();

    match cli.command.take() {
        Some(Command::Login) => {
            handle_login(&db)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Logout) => {
            auth::logout(&db)?;
            println!("✓ API key removed.");
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Explain { file }) => {
            let app = build_app(&cli, &db)?;
            let view = match file {
                Some(path) => app.explain_file(&settings, &path).await,
                None => app.explain_reader(&settings, io::stdin().lock()).await,
            };
            app.print_explain(&view);
            Ok(exit_code(view.errors()))
        }
        Some(Command::Detect { image, open }) => {
            let app = build_app(&cli, &db)?;
            let view = app.detect_file(&settings, &image).await;
            app.print_detect(&view);
            if open && let Some(path) = &view.annotated {
                // Headless sessions have no viewer; the path is already printed.
                if let Err(e) = open::that(path) {
                    warn!(path = %path.display(), error = %e, "failed to open annotated image");
                }
            }
            Ok(exit_code(view.errors()))
        }
        Some(Command::Models) => {
            let app = build_app(&cli, &db)?;
            print!("{}", catalog(&settings, Some(app.detectors())));
            Ok(ExitCode::SUCCESS)
        }
        None => {
            let app = build_app(&cli, &db)?;
            repl(&app, Session::new(settings, auth::status(&db)), &db).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_app(cli: &Cli, db: &str) -> anyhow::Result<App> {
    let auth = AuthStorage::open(db)?;
    let explainer = GroqExplainer::new(cli.base_url.clone(), auth);
    let detectors = DetectorCache::new(Arc::new(OnnxLoader), cli.models_dir.clone());
    let output_dir = cli.output_dir.clone().unwrap_or_else(default_output_dir);
    Ok(App::new(Box::new(explainer), detectors, output_dir))
}

fn exit_code(errors: usize) -> ExitCode {
    if errors == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn repl(app: &App, mut session: Session, db: &str) -> anyhow::Result<()> {
    let settings = session.settings;
    print_banner(&BannerInfo {
        model: settings.model.display_name(),
        detail: settings.detail.label(),
        language: settings.language_label(),
        detector: settings.detector.display_name(),
        auth_status: &session.auth_status,
        models_dir: app.detectors().models_dir(),
        output_dir: app.output_dir(),
    });

    let registry = CommandRegistry::new();

    // Async stdin so Ctrl+C is caught at the prompt too. Commands that
    // prompt (/paste, /login, menus) read from the same buffer.
    let stdin = shared_input(tokio::io::stdin());

    loop {
        print!("\nglance> ");
        io::stdout().flush()?;

        let line = tokio::select! {
            result = async { stdin.lock().await.next_line().await } => {
                match result {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        // Ctrl+D (EOF)
                        println!();
                        break;
                    }
                    Err(e) => {
                        eprintln!("input error: {e}");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let info = SessionInfo {
            settings: &session.settings,
            auth_status: &session.auth_status,
            usage: session.usage,
            db_path: db,
            app: Some(app),
            input: Some(&stdin),
        };

        // Ctrl+C during an action cancels the action, not the REPL
        let result = tokio::select! {
            result = registry.dispatch(input, &info) => result,
            _ = tokio::signal::ctrl_c() => {
                println!("\n\ninterrupted");
                continue;
            }
        };

        match result {
            CommandResult::NotACommand => {
                let view = tokio::select! {
                    view = app.explain_code(&session.settings, input.to_string()) => Some(view),
                    _ = tokio::signal::ctrl_c() => {
                        println!("\n\ninterrupted");
                        None
                    }
                };
                if let Some(view) = view {
                    app.print_explain(&view);
                    session.record(&view);
                }
            }
            CommandResult::Handled => {}
            CommandResult::StateChanged(change) => session.apply(change),
            CommandResult::Quit => break,
        }
    }

    print_session_summary(session.usage);
    Ok(())
}

fn handle_login(db: &str) -> anyhow::Result<()> {
    println!("Create a key at https://console.groq.com/keys\n");
    print!("Paste your Groq API key: ");
    io::stdout().flush()?;

    let mut key = String::new();
    io::stdin()
        .read_line(&mut key)
        .context("failed to read API key")?;
    auth::login(db, &key)?;

    println!("✓ API key saved.");
    println!("  Credentials stored in {db}");
    Ok(())
}
