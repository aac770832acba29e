//! Interactive effect mixing example.
//!
//! Plays a looping WAV file (first argument) or, without one, a two-voice
//! mix with one voice panned to each side. Effects are switched on and off
//! while the signal keeps playing:
//!
//! - S / M / N: swap channels, fold to mono, back to normal
//! - B: toggle an automatic left/right balance sweep
//! - A: toggle amplifier (x3)
//! - O: toggle tremolo
//! - D: toggle overdrive
//! - C: toggle compressor
//! - R: rewind
//! - SPACE: pause / resume
//! - Q or ESC: quit

use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{
        Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
        enable_raw_mode,
    },
};
use kaudio::{
    Amplifier, AudioHost, ComplexFader, CompositeSignal, Compressor, Effect, EffectId, Fader,
    FileSignal, MixControls, Oscillator, Overdriver, Signal, WaveGenerator, WaveType,
};
use std::f64::consts::TAU;
use std::io::{Write, stdout};
use std::panic;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

const AMPLITUDE: f64 = 4000.0;

/// One effect that can be switched in and out of the chain.
struct Toggle {
    key: char,
    label: &'static str,
    make: fn() -> Result<Box<dyn Effect>>,
    active: Option<EffectId>,
}

impl Toggle {
    fn flip(&mut self, signal: &Signal) -> Result<()> {
        match self.active.take() {
            Some(id) => {
                signal.remove_effect(id);
            }
            None => self.active = Some(signal.add_effect((self.make)()?)),
        }
        Ok(())
    }
}

fn toggles() -> Vec<Toggle> {
    vec![
        Toggle {
            key: 'a',
            label: "amplifier",
            make: || Ok(Box::new(Amplifier::new(3.0))),
            active: None,
        },
        Toggle {
            key: 'o',
            label: "tremolo",
            make: || Ok(Box::new(Oscillator::new(15.0, 2.0)?)),
            active: None,
        },
        Toggle {
            key: 'd',
            label: "overdrive",
            make: || Ok(Box::new(Overdriver::new(4.0, AMPLITUDE)?)),
            active: None,
        },
        Toggle {
            key: 'c',
            label: "compressor",
            make: || Ok(Box::new(Compressor::new(3000.0, 1.0, 3000.0, 3.0)?)),
            active: None,
        },
    ]
}

fn build_signal() -> Result<Signal> {
    if let Some(path) = std::env::args().nth(1) {
        return Ok(Signal::new(FileSignal::open(path)?.looping(true)));
    }
    let low = Signal::new(WaveGenerator::new(WaveType::Sine, 220.0, AMPLITUDE)?);
    low.add_effect(Fader::new(1.0, 0.0));
    let high = Signal::new(WaveGenerator::new(WaveType::Triangle, 330.0, AMPLITUDE)?);
    high.add_effect(Fader::new(0.0, 1.0));
    Ok(Signal::new(CompositeSignal::new(vec![low, high])?))
}

/// Slowly moves the mix from one side to the other until `running` clears.
fn spawn_sweep(controls: MixControls, running: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut step = 0u32;
        while running.load(Ordering::Relaxed) {
            let balance = ((TAU * f64::from(step) / 40.0).sin() + 1.0) / 2.0;
            controls.set(balance, 1.0 - balance, 1.0 - balance, balance);
            step = (step + 1) % 40;
            thread::sleep(Duration::from_millis(100));
        }
    })
}

fn draw_ui(mix: &str, sweeping: bool, playing: bool, toggles: &[Toggle]) -> Result<()> {
    let mut stdout = stdout();
    stdout.execute(Clear(ClearType::All))?;
    stdout.execute(crossterm::cursor::MoveTo(0, 0))?;
    write!(stdout, "Live mix ({})\r\n\r\n", if playing { "playing" } else { "paused" })?;
    write!(stdout, "  mix: {}{}\r\n", mix, if sweeping { " (sweeping)" } else { "" })?;
    for toggle in toggles {
        let state = if toggle.active.is_some() { "on" } else { "off" };
        write!(stdout, "  [{}] {:<10} {}\r\n", toggle.key.to_ascii_uppercase(), toggle.label, state)?;
    }
    write!(stdout, "\r\nS/M/N mix, B sweep, R rewind, SPACE pause, Q quit\r\n")?;
    stdout.flush()?;
    Ok(())
}

fn cleanup_terminal() {
    let _ = stdout().execute(crossterm::cursor::Show);
    let _ = stdout().execute(LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

fn main() -> Result<()> {
    env_logger::init();

    let host = AudioHost::init()?;
    let signal = build_signal()?;
    let fader = ComplexFader::identity();
    let controls = fader.controls();
    signal.add_effect(fader);
    signal.play(&host)?;

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(crossterm::cursor::Hide)?;
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        cleanup_terminal();
        original_hook(info);
    }));

    let mut toggles = toggles();
    let mut mix = "normal";
    let sweeping = Arc::new(AtomicBool::new(false));
    let mut sweep = None;
    draw_ui(mix, false, true, &toggles)?;

    loop {
        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => break,
            KeyCode::Char(' ') => {
                if signal.is_playing() {
                    signal.pause()?;
                } else {
                    signal.play(&host)?;
                }
            }
            KeyCode::Char('r') => signal.rewind()?,
            KeyCode::Char('s') => {
                controls.set(0.0, 1.0, 1.0, 0.0);
                mix = "swapped";
            }
            KeyCode::Char('m') => {
                controls.set(0.5, 0.5, 0.5, 0.5);
                mix = "mono";
            }
            KeyCode::Char('n') => {
                controls.set(1.0, 0.0, 0.0, 1.0);
                mix = "normal";
            }
            KeyCode::Char('b') => {
                if sweeping.swap(false, Ordering::Relaxed) {
                    if let Some(handle) = sweep.take() {
                        let _ = handle.join();
                    }
                } else {
                    sweeping.store(true, Ordering::Relaxed);
                    sweep = Some(spawn_sweep(controls.clone(), Arc::clone(&sweeping)));
                }
            }
            KeyCode::Char(c) => {
                if let Some(toggle) = toggles.iter_mut().find(|t| t.key == c) {
                    toggle.flip(&signal)?;
                }
            }
            _ => {}
        }
        draw_ui(
            mix,
            sweeping.load(Ordering::Relaxed),
            signal.is_playing(),
            &toggles,
        )?;
    }

    cleanup_terminal();
    sweeping.store(false, Ordering::Relaxed);
    if let Some(handle) = sweep {
        let _ = handle.join();
    }
    signal.pause()?;
    host.terminate();
    Ok(())
}
