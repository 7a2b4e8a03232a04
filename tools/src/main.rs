//! sim-runner: headless runner for the city HUD simulation.
//!
//! Usage:
//!   sim-runner --seed 12345 --ticks 600 --dt 0.1666
//!   sim-runner --seed 12345 --data-dir ./data --ipc-mode

use anyhow::Result;
use cityhud_core::{
    command::PlayerCommand,
    config::SimConfig,
    engine::SimEngine,
    hud::RegionEntry,
    ledger::TierCounts,
    render::{RegionTracker, RenderSink},
    types::{Rect, RegionId, Tick, Vec2},
};
use std::cell::RefCell;
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::rc::Rc;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Tick {
        count: u64,
        #[serde(default)]
        dt: Option<f64>,
    },
    Command {
        cmd: String,
        #[serde(default)]
        payload: serde_json::Value,
    },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    tick: Tick,
    paused: bool,
    money: i64,
    officers: u32,
    settlements: TierCounts,
    hud_lines: [String; 4],
    money_text: String,
    regions: Vec<RegionEntry>,
}

/// Prints draw calls as `[z] (x, y) text`.
struct ConsoleSink<W: Write> {
    out:   W,
    drawn: usize,
}

impl<W: Write> RenderSink for ConsoleSink<W> {
    fn draw_text(&mut self, text: &str, position: Vec2, z_order: i32) {
        self.drawn += 1;
        if let Err(e) = writeln!(self.out, "  [{z_order}] ({:>6.1}, {:>6.1}) {text}", position.x, position.y) {
            log::warn!("Console sink write failed: {e}");
        }
    }
}

/// Click surface owned by the runner. The HUD keeps it in sync through
/// the engine's region tracker.
#[derive(Default)]
struct ClickRegistry {
    regions: Vec<(RegionId, Rect)>,
}

impl ClickRegistry {
    /// Every tracked region paired with whether `point` falls inside it.
    fn hit_test(&self, point: Vec2) -> Vec<(RegionId, bool)> {
        self.regions.iter().map(|(id, rect)| (id.clone(), rect.contains(point))).collect()
    }
}

impl RegionTracker for ClickRegistry {
    fn track(&mut self, id: &RegionId, rect: Rect) {
        match self.regions.iter_mut().find(|(tracked, _)| tracked == id) {
            Some(entry) => entry.1 = rect,
            None => self.regions.push((id.clone(), rect)),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ticks = parse_arg(&args, "--ticks", 600u64);
    let dt = parse_arg(&args, "--dt", 1.0f64 / 6.0);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str());

    let config = match data_dir {
        Some(dir) => SimConfig::load(Path::new(dir))?,
        None => SimConfig::default(),
    };

    if !ipc_mode {
        println!("City HUD sim-runner");
        println!("  seed:      {seed}");
        println!("  ticks:     {ticks}");
        println!("  dt:        {dt}");
        println!("  data_dir:  {}", data_dir.unwrap_or("(built-in defaults)"));
        println!();
    }

    let mut engine = SimEngine::new(seed, config);

    if ipc_mode {
        let clicks = Rc::new(RefCell::new(ClickRegistry::default()));
        engine.set_region_tracker(Box::new(Rc::clone(&clicks)));
        run_ipc_loop(&mut engine, &clicks, dt)?;
    } else {
        engine.run_ticks(ticks, dt)?;
        print_summary(&engine, ticks);
    }

    Ok(())
}

fn run_ipc_loop(
    engine: &mut SimEngine,
    clicks: &Rc<RefCell<ClickRegistry>>,
    default_dt: f64,
) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                write_error(&mut stdout, e.to_string())?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Tick { count, dt } => match engine.run_ticks(count, dt.unwrap_or(default_dt)) {
                Ok(()) => write_state(&mut stdout, engine)?,
                Err(e) => write_error(&mut stdout, e.to_string())?,
            },
            IpcCommand::GetState => write_state(&mut stdout, engine)?,
            IpcCommand::Command { cmd, payload } => match handle_command(engine, clicks, &cmd, payload) {
                Ok(()) => write_state(&mut stdout, engine)?,
                Err(e) => write_error(&mut stdout, e.to_string())?,
            },
        }
    }
    Ok(())
}

/// Routes a named command to the engine. `click_at` is the input
/// collaborator: it hit-tests region rectangles and flips `clicked`.
fn handle_command(
    engine: &mut SimEngine,
    clicks: &Rc<RefCell<ClickRegistry>>,
    cmd: &str,
    payload: serde_json::Value,
) -> Result<()> {
    match cmd {
        "click_at" => {
            let point = Vec2::new(
                payload["x"].as_f64().unwrap_or_default() as f32,
                payload["y"].as_f64().unwrap_or_default() as f32,
            );
            let hits = clicks.borrow().hit_test(point);
            for (region_id, inside) in hits {
                let command = if inside {
                    PlayerCommand::Click { region_id }
                } else {
                    PlayerCommand::Release { region_id }
                };
                engine.apply_command(command)?;
            }
        }
        "publish" => {
            let kind = payload["kind"].as_str().unwrap_or_default();
            let delivered = engine.bus().publish_raw(kind, payload["payload"].clone())?;
            log::debug!("publish '{kind}' reached {delivered} handler(s)");
        }
        _ => {
            let mut tagged = match payload {
                serde_json::Value::Object(map) => map,
                _ => serde_json::Map::new(),
            };
            tagged.insert("cmd".into(), cmd.into());
            let command: PlayerCommand = serde_json::from_value(tagged.into())?;
            engine.apply_command(command)?;
        }
    }
    Ok(())
}

fn write_state(out: &mut impl Write, engine: &SimEngine) -> Result<()> {
    let state = build_ui_state(engine);
    writeln!(out, "{}", serde_json::to_string(&state)?)?;
    out.flush()?;
    Ok(())
}

fn write_error(out: &mut impl Write, message: String) -> Result<()> {
    writeln!(out, "{}", serde_json::json!({ "error": message }))?;
    out.flush()?;
    Ok(())
}

fn build_ui_state(engine: &SimEngine) -> UiState {
    let display = engine.hud_display();
    UiState {
        tick: engine.clock.current_tick,
        paused: engine.clock.paused,
        money: engine.money(),
        officers: engine.officers(),
        settlements: engine.ledger_counts(),
        hud_lines: display.lines,
        money_text: display.money_text,
        regions: engine.regions(),
    }
}

fn print_summary(engine: &SimEngine, ticks: u64) {
    let counts = engine.ledger_counts();
    let journal = engine.journal_entries();

    println!("=== RUN SUMMARY ===");
    println!("  ticks run:      {ticks}");
    println!("  final tick:     {}", engine.clock.current_tick);
    println!("  sim time:       {:.1}", engine.clock.sim_time);
    println!("  towns:          {}", counts.towns);
    println!("  cities:         {}", counts.cities);
    println!("  metros:         {}", counts.metros);
    println!("  officers:       {}", engine.officers());
    println!("  money:          {}", engine.money());
    println!("  messages:       {}", journal.len());

    println!();
    println!("=== LARGEST SETTLEMENTS ===");
    let mut settlements = engine.settlements();
    settlements.sort_by_key(|s| std::cmp::Reverse(s.tier as u8));
    if settlements.is_empty() {
        println!("  (No settlements founded yet)");
    }
    for s in settlements.iter().take(5) {
        println!("  {:<16} {:<10} founded tick {}", s.name, s.tier.label(), s.founded_at);
    }

    println!();
    println!("=== HUD ===");
    let mut console = ConsoleSink { out: io::stdout(), drawn: 0 };
    engine.render(&mut console);
    if console.drawn == 0 {
        println!("  (nothing to draw)");
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
