use std::time::{Duration, Instant};
use std::fs;

use anyhow::{anyhow, Context};
use sdl2::pixels::Color;
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Scancode;
use sdl2::rect::Rect;

use clap::Parser;

mod buzzer;

use buzzer::*;
use ::vip8::*;

// Hex keypad laid out on the 4x4 block starting at the 4 key:
//   1 2 3 C      4 5 6 7
//   4 5 6 D  ->  R T Y U
//   7 8 9 E      F G H J
//   A 0 B F      V B N M
const SCANCODE_MAPPING: [Scancode; VIP8_KEY_COUNT] = [
    Scancode::B,
    Scancode::Num4,Scancode::Num5,Scancode::Num6,
    Scancode::R,Scancode::T,Scancode::Y,
    Scancode::F,Scancode::G,Scancode::H,
    Scancode::V,Scancode::N,
    Scancode::Num7,Scancode::U,Scancode::J,Scancode::M
];

const TIMER_FREQUENCY: u32 = 60;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg()]
    file: String,

    #[arg(short, long, default_value_t=480, value_parser=clap::value_parser!(u32).range(1..),
          help="Instructions executed per second")]
    freq: u32,

    #[arg(short, long, default_value_t=false,
          help="Start paused: SPACE executes one instruction, RETURN resumes")]
    step: bool,

    #[arg(long, help="Seed for the random number generator, defaults to OS entropy")]
    seed: Option<u64>,

    #[arg(long, default_value_t=640, help="Window width")]
    width: u32,

    #[arg(long, default_value_t=320, help="Window height")]
    height: u32,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.width != args.height * 2 {
        log::warn!("Running in an aspect ratio other than 2:1, display may look stretched!");
    }

    // Load rom and create VM
    let rom = fs::read(&args.file)
        .with_context(|| format!("Could not open file {}", args.file))?;

    let mut vip8 = match args.seed {
        Some(seed) => Vip8::with_seed(&rom, seed)?,
        None => Vip8::new(&rom)?,
    };
    log::info!("Loaded {} ({} bytes)", args.file, rom.len());

    let step_interval = Duration::from_nanos((1e9 / args.freq as f64) as u64);
    let tick_interval = Duration::from_nanos(1_000_000_000 / TIMER_FREQUENCY as u64);
    let mut last_step = Instant::now();
    let mut last_tick = Instant::now();

    // Init SDL2, get a window and a buzzer
    let sdl_context = sdl2::init().map_err(|e| anyhow!(e))?;
    let video_subsystem = sdl_context.video().map_err(|e| anyhow!(e))?;

    let window = video_subsystem.window("Vip8", args.width, args.height)
        .position_centered()
        .build()?;

    let mut canvas = window.into_canvas().accelerated().build()?;
    canvas.set_draw_color(Color::RGB(0, 0, 0));
    canvas.clear();
    canvas.present();

    let mut event_pump = sdl_context.event_pump().map_err(|e| anyhow!(e))?;

    let buzzer = Buzzer::from_sdl_context(&sdl_context)?;

    let mut step_mode = args.step;
    let mut focus = true;

    // Main loop
    let mut running = true;
    while running {
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit {..} |
                Event::KeyDown { scancode: Some(Scancode::Escape), .. } => {
                    running = false
                },
                Event::KeyDown { scancode: Some(Scancode::Space), repeat: false, .. } => {
                    if step_mode {
                        execute(&mut vip8)?;
                        log_state(&vip8);
                    } else {
                        step_mode = true;
                        log::info!("Step mode, SPACE steps and RETURN resumes");
                    }
                },
                Event::KeyDown { scancode: Some(Scancode::Return), .. } => {
                    step_mode = false
                },
                Event::KeyDown { scancode: Some(Scancode::Z), repeat: false, .. } => {
                    vip8.reset();
                    log::info!("Reset");
                },
                Event::Window { win_event: WindowEvent::FocusLost, .. } => {
                    focus = false
                },
                Event::Window { win_event: WindowEvent::FocusGained, .. } => {
                    focus = true
                },
                _ => {}
            }
        }

        // Process input
        let keyboard_state = event_pump.keyboard_state();
        for (k, scancode) in SCANCODE_MAPPING.iter().enumerate() {
            vip8.set_keydown(k, keyboard_state.is_scancode_pressed(*scancode));
        }

        // Wait for a while to stick to processor frequency
        let wait = step_interval.saturating_sub(last_step.elapsed());
        std::thread::sleep(wait);
        last_step = Instant::now();

        if focus && !step_mode {
            execute(&mut vip8)?;
        }

        if last_tick.elapsed() < tick_interval {
            continue;
        }
        last_tick = Instant::now();

        if focus {
            vip8.tick();
        }
        buzzer.set_tone(focus && vip8.is_tone_on());

        canvas.set_draw_color(Color::BLACK);
        canvas.clear();
        let spot_width: u32 = args.width / VIP8_DISPLAY_WIDTH as u32;
        let spot_height: u32 = args.height / VIP8_DISPLAY_HEIGHT as u32;
        canvas.set_draw_color(Color::GREEN);
        for x in 0..VIP8_DISPLAY_WIDTH {
            for y in 0..VIP8_DISPLAY_HEIGHT {
                if vip8.get_display_spot(x, y) {
                    let spot = Rect::new(
                        x as i32 * spot_width as i32, y as i32 * spot_height as i32,
                        spot_width, spot_height);
                    let _ = canvas.fill_rect(spot);
                }
            }
        }
        canvas.present();
    }

    Ok(())
}

// Runs one instruction, dumping the trace before giving up on failure
fn execute(vip8: &mut Vip8) -> anyhow::Result<()> {
    if let Err(e) = vip8.step() {
        log::error!("{}", e);
        for record in vip8.trace().iter() {
            log::error!("  {}", record);
        }
        return Err(e.into());
    }
    Ok(())
}

fn log_state(vip8: &Vip8) {
    if let Some(record) = vip8.trace().last() {
        log::info!("{}", record);
    }
    let registers: Vec<String> = vip8.registers()
        .iter()
        .enumerate()
        .map(|(r, v)| format!("V{:X}={:02X}", r, v))
        .collect();
    log::info!("{}", registers.join(" "));
    log::info!("PC={:03X} I={:04X} SP={:02X} DT={:02X} ST={:02X}",
        vip8.pc(), vip8.i(), vip8.sp(), vip8.dt(), vip8.st());
}
