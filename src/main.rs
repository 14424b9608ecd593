//! blockflow CLI — MIDI playback and WAV export through the pulse synth.
//!
//! Usage:
//!   blockflow path/to/file.mid
//!   blockflow path/to/file.mid --wav output.wav

use bf_master::Controller;
use std::{env, fs};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let path = args.get(1).unwrap_or_else(|| {
        eprintln!("Usage: blockflow <file.mid> [--wav output.wav]");
        std::process::exit(1);
    });

    let wav_path = args
        .iter()
        .position(|a| a == "--wav")
        .and_then(|i| args.get(i + 1))
        .cloned();

    let data = fs::read(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", path, e);
        std::process::exit(1);
    });

    let mut ctrl = Controller::default();
    ctrl.load_midi(&data).unwrap_or_else(|e| {
        eprintln!("Failed to parse MIDI: {}", e);
        std::process::exit(1);
    });

    let timeline = ctrl.timeline();
    println!("Format:   {:?}", timeline.format);
    println!("Tracks:   {}", timeline.tracks.len());
    println!("Events:   {}", timeline.event_count());
    println!(
        "Duration: {:.2} s",
        timeline.duration_micros() as f64 / 1e6
    );
    println!();

    match wav_path {
        Some(wav) => render_to_wav(&ctrl, &wav),
        None => play_audio(&mut ctrl),
    }
}

fn play_audio(ctrl: &mut Controller<bf_engine::PulseLoader>) {
    ctrl.play();
    println!("Playing...");

    while ctrl.is_playing() {
        std::thread::sleep(std::time::Duration::from_millis(50));
    }

    println!("Done.");
}

fn render_to_wav(ctrl: &Controller<bf_engine::PulseLoader>, path: &str) {
    let sample_rate: u32 = 44100;
    println!("Rendering to {} at {} Hz...", path, sample_rate);

    let wav = ctrl.render_to_wav(sample_rate);
    if let Err(e) = fs::write(path, &wav) {
        eprintln!("Failed to write {}: {}", path, e);
        std::process::exit(1);
    }

    println!("Wrote {} bytes.", wav.len());
}
