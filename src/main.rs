use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing::info;

use vision_assistant::adapters::{
    audio::player::CommandAudioPlayer,
    frames::{load_frame, DirectoryFrameSource},
    http::{router, state::HttpState},
    overlay::BroadcastOverlay,
    pipeline::FrameWorker,
    remote::client::RemoteInferenceClient,
};
use vision_assistant::application::{
    narration::NarrationService,
    ports::FrameSource,
    services::{DetectionSession, SnapshotService},
    stats::SessionStats,
};
use vision_assistant::config::{AppConfig, ConfigOverrides};
use vision_assistant::domain::sampler::FrameSampler;

#[derive(Parser)]
#[command(name = "vision-assistant", version, about = "Detección remota con overlay y narración")]
struct Cli {
    /// Fichero TOML de configuración.
    #[arg(long, env = "VISION_CONFIG")]
    config: Option<PathBuf>,
    /// URL base del servidor de inferencia.
    #[arg(long)]
    server: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Sesión en vivo: muestreo de frames, overlay web y narración.
    Live {
        #[arg(long)]
        frames_dir: Option<PathBuf>,
        #[arg(long)]
        fps: Option<u32>,
        /// Dispositivo V4L2 (requiere la feature `camera-v4l2`).
        #[arg(long)]
        camera: Option<String>,
        #[arg(long)]
        sample_interval: Option<u32>,
        #[arg(long)]
        cooldown_ms: Option<u64>,
        #[arg(long)]
        http_addr: Option<String>,
    },
    /// Detecta objetos en una imagen y reproduce la narración.
    Detect { image: PathBuf },
    /// Descripción hablada de una imagen (el servidor devuelve el audio).
    Describe { image: PathBuf },
    /// Lee el texto de una imagen en voz alta.
    Ocr { image: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Inicializar logs (RUST_LOG=info por defecto)
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut cfg = AppConfig::load(cli.config.as_deref())?;
    let mut overrides = ConfigOverrides { server_url: cli.server, ..Default::default() };

    let command = cli.command.unwrap_or(Command::Live {
        frames_dir: None,
        fps: None,
        camera: None,
        sample_interval: None,
        cooldown_ms: None,
        http_addr: None,
    });

    match command {
        Command::Live { frames_dir, fps, camera, sample_interval, cooldown_ms, http_addr } => {
            overrides.frames_dir = frames_dir;
            overrides.fps = fps;
            overrides.camera = camera;
            overrides.sample_interval = sample_interval;
            overrides.cooldown_ms = cooldown_ms;
            overrides.http_addr = http_addr;
            cfg.apply_overrides(overrides)?;
            run_live(cfg).await
        }
        Command::Detect { image } => {
            cfg.apply_overrides(overrides)?;
            run_detect(&cfg, &image).await
        }
        Command::Describe { image } => {
            cfg.apply_overrides(overrides)?;
            run_describe(&cfg, &image).await
        }
        Command::Ocr { image } => {
            cfg.apply_overrides(overrides)?;
            run_ocr(&cfg, &image).await
        }
    }
}

fn snapshot_service(cfg: &AppConfig) -> anyhow::Result<SnapshotService> {
    let client = Arc::new(RemoteInferenceClient::new(&cfg.server_url, cfg.request_timeout)?);
    let player = Arc::new(CommandAudioPlayer::new(cfg.player_program.clone(), cfg.player_args.clone()));
    Ok(SnapshotService::new(client.clone(), client.clone(), client, player))
}

async fn run_detect(cfg: &AppConfig, image: &Path) -> anyhow::Result<()> {
    let frame = load_frame(image)?;
    info!("📤 Enviando {} ({}x{}) a {}", image.display(), frame.width, frame.height, cfg.server_url);

    let result = snapshot_service(cfg)?.detect_once(frame.jpeg).await?;
    if result.is_empty() {
        println!("No objects detected");
    }
    for obj in &result.objects {
        let b = obj.bounding_box;
        println!("{}  [{:.0}, {:.0}, {:.0}, {:.0}]", obj.caption(), b.left, b.top, b.right, b.bottom);
    }
    Ok(())
}

async fn run_describe(cfg: &AppConfig, image: &Path) -> anyhow::Result<()> {
    let frame = load_frame(image)?;
    info!("📤 Pidiendo descripción de {} a {}", image.display(), cfg.server_url);
    let bytes = snapshot_service(cfg)?.describe(frame.jpeg).await?;
    println!("Played description ({bytes} bytes of audio)");
    Ok(())
}

async fn run_ocr(cfg: &AppConfig, image: &Path) -> anyhow::Result<()> {
    let frame = load_frame(image)?;
    let result = snapshot_service(cfg)?.read_text(frame.jpeg).await?;
    println!("{}", result.text);
    Ok(())
}

#[cfg(feature = "camera-v4l2")]
fn open_camera(camera: &str, fps: u32) -> anyhow::Result<Box<dyn FrameSource>> {
    use vision_assistant::adapters::v4l2::{CaptureConfig, V4l2FrameSource};
    let source = V4l2FrameSource::open(&CaptureConfig {
        camera_path: camera.to_string(),
        fourcc: "MJPG".into(),
        width: 640,
        height: 480,
        fps,
    })?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "camera-v4l2"))]
fn open_camera(_camera: &str, _fps: u32) -> anyhow::Result<Box<dyn FrameSource>> {
    anyhow::bail!("camera support not compiled in; rebuild with --features camera-v4l2")
}

fn open_source(cfg: &AppConfig) -> anyhow::Result<Box<dyn FrameSource>> {
    if let Some(camera) = &cfg.source.camera {
        return open_camera(camera, cfg.source.fps);
    }
    let source = DirectoryFrameSource::open(&cfg.source.frames_dir, cfg.source.fps, cfg.source.looped)?;
    info!(
        "🎞️ Fuente de frames: {} imágenes en {} a {} FPS",
        source.len(),
        cfg.source.frames_dir.display(),
        cfg.source.fps
    );
    Ok(Box::new(source))
}

async fn run_live(cfg: AppConfig) -> anyhow::Result<()> {
    info!("🔧 Inicializando adaptadores de infraestructura...");

    // 2. Adaptadores compartidos entre la sesión y el servidor HTTP
    let client = Arc::new(RemoteInferenceClient::new(&cfg.server_url, cfg.request_timeout)?);
    let player = Arc::new(CommandAudioPlayer::new(cfg.player_program.clone(), cfg.player_args.clone()));
    let overlay = Arc::new(BroadcastOverlay::new(16));
    let stats = Arc::new(SessionStats::default());
    let runtime = tokio::runtime::Handle::current();

    // 3. Sesión de detección (muestreo + puerta + narración)
    let narration = NarrationService::spawn(player, cfg.cooldown, stats.clone(), &runtime);
    let session = DetectionSession::new(
        FrameSampler::new(cfg.sample_interval)?,
        client,
        overlay.clone(),
        narration,
        stats,
        runtime,
    );
    let handle = session.handle();

    // 4. Hilo de captura
    let source = open_source(&cfg)?;
    let worker = FrameWorker::spawn(source, session).context("spawning frame worker")?;

    // 5. Dashboard: API, websocket y estáticos
    let cfg = Arc::new(cfg);
    let state = HttpState { overlay, session: handle.clone(), config: cfg.clone() };
    let app = router(state).fallback_service(ServeDir::new(&cfg.static_dir));

    let listener = tokio::net::TcpListener::bind(&cfg.http_addr).await?;
    info!("🚀 Dashboard en http://{} (servidor de inferencia: {})", cfg.http_addr, cfg.server_url);
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    let worker_done = tokio::task::spawn_blocking(move || worker.join());
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Ctrl-C recibido, deteniendo..."),
        _ = worker_done => info!("Captura terminada"),
    }

    // 6. Desmontaje: parar admisión, vaciar narración y cerrar el dashboard
    handle.stop().await;
    server.abort();

    let stats = handle.stats();
    info!(
        "Resumen: {} frames, {} muestreados, {} enviados, {} ocupados, {} errores, {} narraciones",
        stats.frames_seen,
        stats.frames_sampled,
        stats.frames_submitted,
        stats.frames_dropped_busy,
        stats.inference_errors,
        stats.narration_started
    );
    Ok(())
}
