use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use arch_landmark_viewer::markers::MeshSlot;
use arch_landmark_viewer::notation::Numbering;
use arch_landmark_viewer::payload::AnalysisPayload;
use arch_landmark_viewer::server::{self, AppState, Session};
use arch_landmark_viewer::watcher;

/// Arch Landmark Viewer - paired STL scans with tooth landmarks
#[derive(Parser, Debug)]
#[command(name = "arch-landmark-viewer")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Server port
  #[arg(short, long, default_value = "8080")]
  port: u16,

  /// Bind address
  #[arg(long, default_value = "127.0.0.1")]
  host: String,

  /// Directory holding (and receiving uploaded) STL files
  #[arg(short, long, default_value = "scene")]
  scene_dir: PathBuf,

  /// Landmark payload to load and watch; the bundled sample is used otherwise
  #[arg(long)]
  payload: Option<PathBuf>,

  /// How tooth numbers on the first mesh are encoded
  #[arg(long, value_enum, default_value = "positional")]
  mesh1_numbering: Numbering,

  /// How tooth numbers on the second mesh are encoded
  #[arg(long, value_enum, default_value = "fdi")]
  mesh2_numbering: Numbering,

  /// Largest accepted request body, in MiB
  #[arg(long, default_value = "256")]
  max_upload_mb: usize,

  /// Auto-open browser on startup
  #[arg(short, long)]
  open: bool,

  /// Show keyboard controls help
  #[arg(long)]
  help_keys: bool,

  /// Show available settings
  #[arg(long)]
  help_settings: bool,
}

impl Cli {
  fn slots(&self) -> [MeshSlot; 2] {
    let mut mesh1 = MeshSlot::mesh1();
    mesh1.numbering = self.mesh1_numbering;
    let mut mesh2 = MeshSlot::mesh2();
    mesh2.numbering = self.mesh2_numbering;
    [mesh1, mesh2]
  }

  fn initial_payload(&self) -> Result<AnalysisPayload> {
    match &self.payload {
      Some(path) if path.exists() => AnalysisPayload::load(path)
        .with_context(|| format!("could not read landmark payload {:?}", path)),
      Some(path) => {
        info!("{:?} does not exist yet, starting from the bundled sample", path);
        Ok(AnalysisPayload::sample())
      }
      None => Ok(AnalysisPayload::sample()),
    }
  }
}

fn print_keyboard_help() {
  println!("Arch Landmark Viewer - Keyboard Controls\n");
  println!("Navigation:");
  println!("  Mouse drag       Rotate camera");
  println!("  Right drag       Pan");
  println!("  Mouse wheel      Zoom in/out");
  println!("  0                Reset camera to initial position");
  println!("  f                Frame all visible meshes");
  println!();
  println!("View:");
  println!("  1                Toggle mesh 1");
  println!("  2                Toggle mesh 2");
  println!("  m                Toggle landmark markers");
  println!("  g                Toggle grid visibility");
  println!("  Tab              Toggle side panel");
  println!("  r                Reload meshes and landmarks");
  println!();
}

fn print_settings_help() {
  println!("Arch Landmark Viewer - Available Settings\n");
  println!("Basic Options:");
  println!("  -p, --port <PORT>              Server port (default: 8080)");
  println!("      --host <HOST>              Bind address (default: 127.0.0.1)");
  println!("  -s, --scene-dir <PATH>         STL directory (default: scene)");
  println!("      --payload <FILE>           Landmark payload JSON to load and watch");
  println!("  -o, --open                     Auto-open browser on startup");
  println!();
  println!("Landmarks:");
  println!("      --mesh1-numbering <MODE>   positional | fdi (default: positional)");
  println!("      --mesh2-numbering <MODE>   positional | fdi (default: fdi)");
  println!("      --max-upload-mb <MIB>      Request body limit (default: 256)");
  println!();
  println!("Help:");
  println!("  -h, --help                     Show this help message");
  println!("  -V, --version                  Show version");
  println!("      --help-keys                Show keyboard controls");
  println!("      --help-settings            Show this settings help");
  println!();
  println!("Logging is controlled with RUST_LOG (e.g. RUST_LOG=debug).");
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  if cli.help_keys {
    print_keyboard_help();
    return Ok(());
  }

  if cli.help_settings {
    print_settings_help();
    return Ok(());
  }

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    )
    .init();

  std::fs::create_dir_all(&cli.scene_dir)
    .with_context(|| format!("could not create scene directory {:?}", cli.scene_dir))?;

  let payload = cli.initial_payload()?;
  info!(
    "landmark payload {:?}: {} + {} record(s)",
    payload.id,
    payload.mesh1.records.len(),
    payload.mesh2.records.len()
  );

  let state = AppState::new(cli.scene_dir.clone(), Session::new(payload, cli.slots()));
  watcher::spawn(state.clone(), cli.payload.clone())?;

  let app = server::router(state, cli.max_upload_mb.saturating_mul(1024 * 1024));

  let addr = format!("{}:{}", cli.host, cli.port);
  let listener = tokio::net::TcpListener::bind(&addr)
    .await
    .with_context(|| format!("could not bind {}", addr))?;

  info!("Arch Landmark Viewer running at http://{}", addr);
  info!("Scene directory: {:?}", cli.scene_dir);

  let url = format!("http://{}", addr);
  if cli.open {
    info!("Opening browser...");
    if let Err(e) = open::that(&url) {
      tracing::warn!("could not open browser: {}", e);
    }
  } else {
    println!("Open your browser to {}", url);
  }

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}
