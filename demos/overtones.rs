//! Overtone series example.
//!
//! Pick a note from A to G, then press ENTER to stack the next overtone on
//! top of what is already playing. Each overtone is added to the running
//! composite without interrupting playback. Enter "q" to quit.
//!
//! Run with `RUST_LOG=debug` to see streams and children come and go.

use anyhow::{Result, bail};
use kaudio::{AudioHost, CompositeSignal, Signal, WaveGenerator, WaveType};
use std::io::{BufRead, Write, stdin, stdout};

/// Loud enough to hear, quiet enough that a few stacked overtones don't clip.
const AMPLITUDE: f64 = 4000.0;

fn note_frequency(note: &str) -> Option<f64> {
    let freq = match note {
        "a" => 440.000,
        "b" => 493.883,
        "c" => 523.251,
        "d" => 587.330,
        "e" => 659.255,
        "f" => 698.456,
        "g" => 783.991,
        _ => return None,
    };
    Some(freq)
}

fn prompt(lines: &mut impl Iterator<Item = std::io::Result<String>>, text: &str) -> Result<String> {
    print!("{}", text);
    stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(line?.trim().to_lowercase()),
        None => bail!("stdin closed"),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let host = AudioHost::init()?;
    let mut lines = stdin().lock().lines();

    let mut freq = loop {
        let answer = prompt(&mut lines, "Enter a note A through G: ")?;
        match note_frequency(&answer) {
            Some(freq) => break freq,
            None => println!("Invalid input."),
        }
    };

    let root = WaveGenerator::new(WaveType::Sine, freq, AMPLITUDE)?;
    let series = Signal::new(CompositeSignal::new(vec![Signal::new(root)])?);
    series.play(&host)?;
    println!("Playing {:.1} Hz", freq);

    let mut overtone = 0u32;
    loop {
        let answer = prompt(
            &mut lines,
            "Enter \"q\" to quit, or anything else to play the next overtone: ",
        )?;
        if answer == "q" {
            break;
        }
        overtone += 1;
        freq += freq / f64::from(overtone);
        series.add_signal(Signal::new(WaveGenerator::new(WaveType::Sine, freq, AMPLITUDE)?))?;
        println!("Added overtone {} at {:.1} Hz", overtone, freq);
    }

    series.pause()?;
    host.terminate();
    Ok(())
}
