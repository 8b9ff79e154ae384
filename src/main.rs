use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use guided_meditation::assessment::AssessmentData;
use guided_meditation::audio::{AudioBackend, SimulatedBackend};
use guided_meditation::config::Config;
use guided_meditation::narration::{select_synthesizer, LocalSpeechSynthesizer, ProviderSynthesizer};
use guided_meditation::playback::{self, SessionLoader};
use guided_meditation::script::duration::word_budget_with;
use guided_meditation::script::{
    LlmScriptGenerator, MeditationScript, PromptTemplate, ScriptGenerator, StaticScriptGenerator,
};
use guided_meditation::session::{SavedSession, SessionConfig, StateStore};
use guided_meditation::{create_router, terminal, AppState, LlmClient};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "guided-meditation", version, about = "Guided meditation sessions")]
struct Cli {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/guided-meditation")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve,
    /// Generate, narrate and play a session in the terminal
    Play(PlayArgs),
    /// Word budget for a session length
    Budget { minutes: f64 },
    /// Saved sessions
    Sessions {
        #[command(subcommand)]
        action: Option<SessionsAction>,
    },
    /// Cumulative stats
    Stats,
}

#[derive(Subcommand)]
enum SessionsAction {
    List,
    Show { id: Uuid },
}

#[derive(Args)]
struct PlayArgs {
    /// Replay a saved session
    #[arg(long, conflicts_with = "goal")]
    session: Option<Uuid>,

    #[arg(long, default_value = "stress-relief")]
    goal: String,

    #[arg(long, default_value_t = 10.0)]
    minutes: f64,

    #[arg(long, default_value = "")]
    current_state: String,

    #[arg(long, default_value = "beginner")]
    experience: String,

    #[arg(long, default_value = "")]
    environment: String,

    #[arg(long, default_value = "mindfulness")]
    wisdom: String,

    /// Repeat for several feelings
    #[arg(long = "feeling")]
    feelings: Vec<String>,

    #[arg(long)]
    primer: Option<String>,

    /// Voice id; defaults to the configured voice
    #[arg(long)]
    voice: Option<String>,

    #[arg(long)]
    music_file: Option<PathBuf>,

    #[arg(long)]
    music_volume: Option<f32>,

    #[arg(long)]
    voice_volume: Option<f32>,

    /// Save the session under this name after loading
    #[arg(long)]
    save: Option<String>,

    /// Start as soon as loading finishes
    #[arg(long)]
    autostart: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Guided Meditation v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Serve => serve(cfg).await,
        Command::Play(args) => play(cfg, args).await,
        Command::Budget { minutes } => {
            let words = word_budget_with(
                minutes,
                cfg.session.lead_in_secs as f64,
                cfg.session.fade_out_secs as f64,
                cfg.session.words_per_minute,
            );
            println!("{} words for {} minutes", words, minutes);
            Ok(())
        }
        Command::Sessions { action } => sessions(cfg, action).await,
        Command::Stats => {
            let store = StateStore::open(&cfg.storage.data_dir).await?;
            let stats = store.snapshot().await.stats;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
    }
}

fn build_generator(cfg: &Config) -> Option<Arc<dyn ScriptGenerator>> {
    match LlmClient::new(&cfg.llm) {
        Ok(client) => {
            let template = PromptTemplate::load(&cfg.prompts.template_path);
            Some(Arc::new(LlmScriptGenerator::new(
                client,
                template,
                cfg.session.clone(),
            )))
        }
        Err(e) => {
            warn!("Script generation unavailable: {}", e);
            None
        }
    }
}

async fn serve(cfg: Config) -> Result<()> {
    let store = Arc::new(StateStore::open(&cfg.storage.data_dir).await?);

    let mut state = AppState::new(store).with_api_tokens(cfg.auth.api_tokens.clone());
    if let Some(generator) = build_generator(&cfg) {
        state = state.with_generator(generator);
    }
    match ProviderSynthesizer::new(&cfg.narration) {
        Ok(provider) => state = state.with_narration(Arc::new(provider)),
        Err(e) => info!("Hosted narration disabled ({}), clients fall back to local speech", e),
    }
    if state.api_tokens.is_empty() {
        warn!("No API tokens configured, authentication is disabled");
    }

    let app = create_router(state);
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")
}

async fn play(cfg: Config, args: PlayArgs) -> Result<()> {
    let store = StateStore::open(&cfg.storage.data_dir).await?;

    let (session, script, saved_id) = match args.session {
        Some(id) => {
            let state = store.snapshot().await;
            let Some(saved) = state.saved_session(id) else {
                bail!("No saved session {}", id);
            };
            (saved.config.clone(), saved.script.clone(), Some(id))
        }
        None => {
            let assessment = AssessmentData {
                goal: args.goal.clone(),
                current_state: args.current_state.clone(),
                duration_minutes: args.minutes,
                experience: args.experience.clone(),
                environment: args.environment.clone(),
                wisdom_source: args.wisdom.clone(),
                selected_feelings: args.feelings.clone(),
                primer: args.primer.clone(),
            };
            if let Err(message) = assessment.validate() {
                bail!("Invalid session: {}", message);
            }
            let voice = args
                .voice
                .clone()
                .unwrap_or_else(|| cfg.narration.default_voice_id.clone());
            let name = args
                .save
                .clone()
                .unwrap_or_else(|| format!("{} ({} min)", args.goal, args.minutes));
            (SessionConfig::from_assessment(name, voice, assessment), None, None)
        }
    };

    let mut session = session;
    if let Some(path) = args.music_file.clone() {
        session.layers.music_file = Some(path);
    }
    if let Some(volume) = args.music_volume {
        session.layers.music_volume = volume;
    }
    if let Some(volume) = args.voice_volume {
        session.layers.voice_volume = volume;
    }

    #[cfg(feature = "playback")]
    {
        match guided_meditation::audio::output::RodioBackend::new() {
            Ok(backend) => {
                return run_session(&cfg, &store, &backend, session, script, saved_id, &args).await
            }
            Err(e) => warn!("No audio output ({:#}), playing silently", e),
        }
    }

    run_session(
        &cfg,
        &store,
        &SimulatedBackend::new(),
        session,
        script,
        saved_id,
        &args,
    )
    .await
}

async fn run_session<B>(
    cfg: &Config,
    store: &StateStore,
    backend: &B,
    session: SessionConfig,
    script: Option<MeditationScript>,
    saved_id: Option<Uuid>,
    args: &PlayArgs,
) -> Result<()>
where
    B: AudioBackend,
    B::Element: 'static,
{
    let generator = build_generator(cfg).unwrap_or_else(|| -> Arc<dyn ScriptGenerator> {
        Arc::new(StaticScriptGenerator::new(MeditationScript::fallback()))
    });
    let narrator = select_synthesizer(&cfg.narration);
    let fallback = LocalSpeechSynthesizer::new(&cfg.narration.local_command)
        .with_words_per_minute(cfg.session.words_per_minute);

    println!("Preparing your meditation...");

    let loader = SessionLoader {
        backend,
        generator: generator.as_ref(),
        narrator: narrator.as_ref(),
        fallback: &fallback,
        timing: &cfg.session,
        speed: cfg.narration.speed,
    };
    let loaded = loader.load(&session, script).await;

    if loaded.degraded {
        println!("Narration is using local speech.");
    }
    if let Some(title) = &loaded.script.title {
        println!("{}", title);
    }

    let saved_id = match (&args.save, saved_id) {
        (Some(_), None) => {
            let saved = SavedSession::new(session.clone(), Some(loaded.script.clone()));
            let id = saved.id;
            store.update(move |s| s.with_saved_session(saved)).await?;
            println!("Saved as {}", id);
            Some(id)
        }
        (_, id) => id,
    };

    let (handle, task) = playback::spawn(loaded.coordinator);
    let finished = terminal::present(handle, args.autostart).await?;

    // Quitting drops the last handle and tears the session down
    let summary = task.await.context("Session task failed")?;

    match summary {
        Some(summary) if finished => {
            let now = Utc::now();
            let next = store
                .update(|s| {
                    let s = s.with_completed_session(&summary, now);
                    match saved_id {
                        Some(id) => s.with_played(id, now),
                        None => s,
                    }
                })
                .await?;
            println!(
                "{} min credited, {} min total across {} sessions.",
                summary.minutes(),
                next.stats.total_minutes,
                next.stats.sessions_completed
            );
        }
        _ => info!("Session ended without completing"),
    }

    Ok(())
}

async fn sessions(cfg: Config, action: Option<SessionsAction>) -> Result<()> {
    let store = StateStore::open(&cfg.storage.data_dir).await?;
    let state = store.snapshot().await;

    match action.unwrap_or(SessionsAction::List) {
        SessionsAction::List => {
            if state.saved_sessions.is_empty() {
                println!("No saved sessions.");
            }
            for session in &state.saved_sessions {
                println!(
                    "{}  {:<30}  {:>5.1} min  {}",
                    session.id,
                    session.config.name,
                    session.config.requested_duration_minutes,
                    session
                        .last_played_at
                        .map_or("never played".to_string(), |at| at.to_rfc3339())
                );
            }
        }
        SessionsAction::Show { id } => match state.saved_session(id) {
            Some(session) => println!("{}", serde_json::to_string_pretty(session)?),
            None => bail!("No saved session {}", id),
        },
    }

    Ok(())
}
