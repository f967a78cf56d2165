use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dino::draw::{Canvas, Hud, draw_scene};
use dino::{AgentRole, Control, Controller, DeviceSource, Game, GameConfig, Perceptron, SpriteSizes};
use pixels::{Pixels, SurfaceTexture};
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::event::{Event, VirtualKeyCode, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;
use winit_input_helper::WinitInputHelper;

#[derive(Parser)]
#[command(name = "dino")]
#[command(version, about = "Dino runner with an online perceptron pilot")]
struct Cli {
    /// Who drives the runner
    #[arg(long, default_value = "agent")]
    mode: Mode,

    /// JSON config file; defaults are used for missing fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the obstacle scheduler
    #[arg(long)]
    seed: Option<u64>,

    /// Train without a window
    #[arg(long)]
    headless: bool,

    /// Deaths to train for in headless mode
    #[arg(long, default_value = "100")]
    episodes: u32,

    /// Tick budget in headless mode
    #[arg(long, default_value = "5000000")]
    max_ticks: u64,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Jump with the Up key
    Manual,
    /// The perceptron jumps; Enter starts the first session
    Agent,
}

enum Pilot {
    Manual,
    Agent(Controller<Perceptron>),
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => GameConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => GameConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    let sizes = SpriteSizes::classic(config.scale);

    if cli.headless {
        return run_headless(config, &sizes, cli.episodes, cli.max_ticks);
    }
    run_window(config, &sizes, cli.mode)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn agent_pilot(learning_rate: f32) -> Controller<Perceptron> {
    Controller::new(
        [(Control::Play, AgentRole::Restart), (Control::Jump, AgentRole::Jump)],
        Perceptron::new(learning_rate),
    )
}

fn run_headless(config: GameConfig, sizes: &SpriteSizes, episodes: u32, max_ticks: u64) -> Result<()> {
    let mut pilot = agent_pilot(config.learning_rate);
    let mut game = Game::new(config, sizes).context("building game")?;
    pilot.set(Control::Play, true);

    let mut best = 0;
    let mut ticks = 0u64;
    while pilot.source().deaths() < episodes && ticks < max_ticks {
        game.tick(&mut pilot);
        best = best.max(game.state().score);
        ticks += 1;
    }
    if ticks >= max_ticks {
        warn!(ticks, "tick budget exhausted");
    }

    let agent = pilot.source();
    info!(deaths = agent.deaths(), best, ticks, "training finished");
    println!("deaths: {}  best score: {}", agent.deaths(), best);
    println!("weights: {:?}", agent.weights());
    Ok(())
}

fn run_window(config: GameConfig, sizes: &SpriteSizes, mode: Mode) -> Result<()> {
    let (width, height) = (config.display_width, config.display_height);
    let tick_duration = Duration::from_millis(config.frame_delay_ms as u64);

    let event_loop = EventLoop::new();
    let mut input = WinitInputHelper::new();
    let window = WindowBuilder::new()
        .with_title("Dino")
        .with_inner_size(LogicalSize::new(width, height))
        .with_resizable(false)
        .build(&event_loop)
        .context("creating window")?;

    let mut pixels = {
        let window_size = window.inner_size();
        let surface_texture = SurfaceTexture::new(window_size.width, window_size.height, &window);
        Pixels::new(width, height, surface_texture).context("creating pixel buffer")?
    };

    let mut keyboard = Controller::new(
        [
            (Control::Play, VirtualKeyCode::Return),
            (Control::Skip, VirtualKeyCode::LShift),
            (Control::Freeze, VirtualKeyCode::Space),
            (Control::Hitboxes, VirtualKeyCode::Key1),
            (Control::Jump, VirtualKeyCode::Up),
        ],
        DeviceSource::new(),
    );
    let keys: Vec<VirtualKeyCode> = keyboard.bindings().map(|&(_, key)| key).collect();

    let mut pilot = match mode {
        Mode::Manual => Pilot::Manual,
        Mode::Agent => Pilot::Agent(agent_pilot(config.learning_rate)),
    };
    let mut game = Game::new(config, sizes).context("building game")?;
    let mut last_tick = Instant::now();
    let (mut freeze_was, mut hitboxes_was) = (false, false);
    let mut focused = true;

    info!(width, height, "window open; press Enter to start");

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        if let Event::RedrawRequested(_) = event {
            let hud = match &pilot {
                Pilot::Manual => Hud::default(),
                Pilot::Agent(agent) => Hud {
                    deaths: Some(agent.source().deaths()),
                    weights: Some(*agent.source().weights()),
                },
            };
            draw_scene(&mut Canvas::new(pixels.frame_mut(), width, height), game.state(), &hud);
            if let Err(err) = pixels.render() {
                warn!(%err, "render failed");
                *control_flow = ControlFlow::Exit;
                return;
            }
        }

        // held keys never see their release once the window loses focus
        if let Event::WindowEvent {
            event: WindowEvent::Focused(now_focused),
            ..
        } = &event
        {
            focused = *now_focused;
            if !focused {
                keyboard.source_mut().release_all();
            }
        }

        if !input.update(&event) {
            return;
        }
        if input.key_pressed(VirtualKeyCode::Escape) || input.close_requested() || input.destroyed() {
            *control_flow = ControlFlow::Exit;
            return;
        }

        if focused {
            for &key in &keys {
                keyboard.source_mut().set_key(key, input.key_held(key));
            }
        }

        let unpaced = keyboard.get(Control::Skip);
        if !unpaced && last_tick.elapsed() < tick_duration {
            return;
        }
        last_tick = Instant::now();

        keyboard.tick(game.state());
        match &mut pilot {
            Pilot::Manual => game.tick(&mut keyboard),
            Pilot::Agent(agent) => {
                if keyboard.get(Control::Play) {
                    agent.set(Control::Play, true);
                }
                game.tick(agent);
            }
        }

        let freeze = keyboard.get(Control::Freeze);
        if freeze && !freeze_was {
            let state = game.state_mut();
            state.paused_for_learning = !state.paused_for_learning;
            info!(paused = state.paused_for_learning, "learning pause toggled");
        }
        freeze_was = freeze;

        let hitboxes = keyboard.get(Control::Hitboxes);
        if hitboxes && !hitboxes_was {
            let state = game.state_mut();
            state.show_hitboxes = !state.show_hitboxes;
        }
        hitboxes_was = hitboxes;

        window.request_redraw();
    });
}
