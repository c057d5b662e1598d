use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{self, Duration, Instant};
use tracing::{info, warn};

use deck_control::doctor as control_doctor;
use deck_control::{ControlConfig, QuickAction};
use deck_panels::{ConfigPanel, ControlPanel, Dashboard, DashboardConfig, FrameSource, MappingPanel, TestPattern};
use deck_proto::draft::ConfigDraft;
use deck_session::doctor as session_doctor;
use deck_session::{AddressStore, FileStore, LoginForm, MemoryStore, Navigator, SessionConfig, SessionContext};
use deck_sim::doctor as sim_doctor;
use deck_sim::{DriftOverrides, DriftProfile, OpsConfig, SimulatedBackend};

#[derive(Debug, Parser)]
#[command(name = "deck", version, about = "SkyDeck - drone ground-control dashboard core")]
struct Cli {
    /// TOML config; built-in defaults when omitted.
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Doctor,
    /// Scripted session: login, config save, mapping, video, then live control telemetry.
    Run {
        #[arg(long)]
        user: String,
        #[arg(long)]
        address: String,
        /// How long to follow control telemetry.
        #[arg(long, default_value_t = 15)]
        seconds: u64,
    },
    /// Map the area and print the building report.
    Survey {
        #[arg(long)]
        json: bool,
    },
    /// Save a mission target to the device.
    SaveConfig {
        #[arg(long, allow_hyphen_values = true)]
        latitude: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        longitude: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        altitude: Option<String>,
    },
    /// Drive the control pad from stdin (`down w`, `up w`, `lock`, `speed 70`, `action land`, ...).
    Control,
    /// Print the persisted device address.
    Status,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct Config {
    session: SessionConfig,
    telemetry: TelemetryCfg,
    ops: OpsConfig,
    control: ControlConfig,
    draft: ConfigDraft,
}

/// Each section is layered over its own preset.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct TelemetryCfg {
    control: DriftOverrides,
    video: DriftOverrides,
}

impl TelemetryCfg {
    fn control(&self) -> DriftProfile {
        self.control.apply(DriftProfile::control())
    }

    fn video(&self) -> DriftProfile {
        self.video.apply(DriftProfile::video())
    }
}

impl Config {
    fn dashboard(&self) -> DashboardConfig {
        DashboardConfig {
            control: self.control.clone(),
            control_telemetry: self.telemetry.control(),
            video_telemetry: self.telemetry.video(),
            ops: self.ops.clone(),
            draft: self.draft,
        }
    }
}

fn load_config(path: Option<&str>) -> Result<Config> {
    let Some(path) = path else { return Ok(Config::default()) };
    let s = std::fs::read_to_string(path).with_context(|| format!("read config {}", path))?;
    parse_config(&s)
}

fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config toml")
}

fn address_store(cfg: &SessionConfig) -> Box<dyn AddressStore> {
    match &cfg.address_store {
        Some(path) => Box::new(FileStore::new(path)),
        None => Box::new(MemoryStore::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref())?;

    match cli.cmd {
        Command::Doctor => doctor(&cfg)?,
        Command::Run { user, address, seconds } => run(&cfg, user, address, seconds).await?,
        Command::Survey { json } => survey(&cfg, json).await?,
        Command::SaveConfig { latitude, longitude, altitude } => save_config(&cfg, latitude, longitude, altitude).await?,
        Command::Control => control(&cfg).await?,
        Command::Status => status(&cfg)?,
    }
    Ok(())
}

fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");
    session_doctor::check_session(&cfg.session)?;
    sim_doctor::check_profile("control", &cfg.telemetry.control())?;
    sim_doctor::check_profile("video", &cfg.telemetry.video())?;
    sim_doctor::check_ops(&cfg.ops)?;
    control_doctor::check_control(&cfg.control)?;
    anyhow::ensure!(
        [cfg.draft.latitude, cfg.draft.longitude, cfg.draft.altitude_m].iter().all(|v| v.is_finite()),
        "draft defaults must be numeric"
    );

    if let Err(e) = address_store(&cfg.session).load() {
        warn!("address store unreadable: {:#}", e);
    }
    info!("doctor: OK");
    Ok(())
}

async fn run(cfg: &Config, user: String, address: String, seconds: u64) -> Result<()> {
    info!("run: starting");
    let store = address_store(&cfg.session);

    let mut nav = Navigator::new();
    nav.splash(Duration::from_millis(cfg.session.splash_ms)).await;
    nav.submit_login(LoginForm::new(user, address), store.as_ref())?;

    let mut dash = Dashboard::new(
        nav,
        cfg.dashboard(),
        SimulatedBackend::new(&cfg.ops),
        Box::new(|| Box::new(TestPattern::default()) as Box<dyn FrameSource>),
    )?;

    dash.submit_config()?;
    info!(flags = ?dash.active_flags(), "config submitted");
    let cp = dash.config_panel()?;
    cp.wait().await;
    if let Some(e) = cp.last_error() {
        warn!("config save failed: {}", e);
    }

    dash.start_mapping()?;
    info!(flags = ?dash.active_flags(), "mapping started");
    let mp = dash.mapping_panel()?;
    mp.wait().await;
    match (mp.report(), mp.last_error()) {
        (Some(r), _) => info!(area_m2 = r.area_m2, density = r.survey.density_pct(), "mapping done"),
        (None, Some(e)) => warn!("mapping failed: {}", e),
        _ => {}
    }

    let vp = dash.video_panel()?;
    vp.start_streaming();
    vp.toggle_recording()?;
    info!(flags = ?vp.flags(), "video streaming");
    time::sleep(Duration::from_secs(5)).await;
    let frame = vp.capture_screenshot()?;
    info!(
        device = vp.device_address(),
        signal = vp.signal_pct(),
        recorded = %vp.elapsed_display(),
        frame = frame.seq,
        "video check done"
    );
    vp.stop_streaming();

    let mut rx = dash.control_panel()?.subscribe();
    println!("{}", serde_json::to_string(&rx.borrow_and_update().view())?);
    let deadline = Instant::now() + Duration::from_secs(seconds);
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() { break; }
                let view = rx.borrow_and_update().view();
                println!("{}", serde_json::to_string(&view)?);
            }
            _ = time::sleep_until(deadline) => break,
            _ = tokio::signal::ctrl_c() => {
                info!("run: interrupted");
                break;
            }
        }
    }

    drop(dash);
    info!("run: done");
    Ok(())
}

async fn survey(cfg: &Config, json: bool) -> Result<()> {
    let backend = SimulatedBackend::new(&cfg.ops);
    let mut panel = MappingPanel::mount(&cfg.ops);
    panel.start(&backend);
    panel.wait().await;
    if let Some(e) = panel.last_error() {
        anyhow::bail!("mapping failed: {}", e);
    }
    let report = panel.report().context("mapping produced no report")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }
    Ok(())
}

async fn save_config(
    cfg: &Config,
    latitude: Option<String>,
    longitude: Option<String>,
    altitude: Option<String>,
) -> Result<()> {
    let backend = SimulatedBackend::new(&cfg.ops);
    let mut panel = ConfigPanel::mount(cfg.draft, &cfg.ops);
    for (field, raw) in [("latitude", latitude), ("longitude", longitude), ("altitude", altitude)] {
        if let Some(raw) = raw {
            panel.set_field(field, &raw)?;
        }
    }
    panel.submit(&backend);
    panel.wait().await;
    if let Some(e) = panel.last_error() {
        anyhow::bail!("save failed: {}", e);
    }
    let saved = panel.last_saved().context("save produced no result")?;
    println!("{}", serde_json::to_string(&saved)?);
    Ok(())
}

async fn control(cfg: &Config) -> Result<()> {
    let mut pad = ControlPanel::mount(cfg.control.clone(), cfg.telemetry.control());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        let (Some(cmd), arg) = (words.next(), words.next()) else { continue };
        let out = match (cmd, arg) {
            ("down", Some(key)) => pad.key_down(key).to_string(),
            ("up", Some(key)) => pad.key_up(key).to_string(),
            ("lock", _) | ("unlock", _) => {
                if pad.controls().is_locked() != (cmd == "lock") {
                    pad.toggle_lock();
                }
                format!("locked={}", pad.controls().is_locked())
            }
            ("speed", Some(v)) => match v.parse::<u8>() {
                Ok(v) => match pad.set_speed(v) {
                    Ok(s) => format!("speed={}", s),
                    Err(e) => e.to_string(),
                },
                Err(_) => format!("bad speed: {}", v),
            },
            ("action", Some(a)) => match a.parse::<QuickAction>().and_then(|a| pad.quick_action(a).map(|_| a)) {
                Ok(a) => format!("action={}", a),
                Err(e) => e.to_string(),
            },
            ("record", _) => match pad.toggle_recording() {
                Ok(r) => format!("recording={}", r),
                Err(e) => e.to_string(),
            },
            ("telemetry", _) => serde_json::to_string(&pad.telemetry().view())?,
            ("state", _) => format!(
                "intents={} locked={} speed={} recording={} last_action={}",
                pad.controls().intents(),
                pad.controls().is_locked(),
                pad.controls().speed(),
                pad.controls().is_recording(),
                pad.controls().last_action().map(|a| a.to_string()).unwrap_or_else(|| "-".into()),
            ),
            _ => format!("unknown command: {}", line.trim()),
        };
        println!("{}", out);
    }
    Ok(())
}

fn status(cfg: &Config) -> Result<()> {
    let store = address_store(&cfg.session);
    println!("{}", status_line(store.as_ref(), &cfg.session));
    Ok(())
}

fn status_line(store: &dyn AddressStore, cfg: &SessionConfig) -> String {
    let ctx = SessionContext::restore(store, &cfg.default_device_address);
    format!("device_address={}", ctx.device_address())
}
