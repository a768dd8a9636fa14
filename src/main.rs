#[cfg(not(all(feature = "streaming", feature = "softsynth")))]
fn main() {
    eprintln!(
        "The ym-stream CLI requires the \"streaming\" and \"softsynth\" features. Rebuild with `--features streaming` to enable playback."
    );
}

#[cfg(all(feature = "streaming", feature = "softsynth"))]
mod cli {
    use std::env;
    use std::fs;
    use std::io::{self, Write};
    use std::thread;
    use std::time::Duration;

    use anyhow::{Context, Result};
    use ym_stream::softsynth::{demo_track, SoftToneDecoder};
    use ym_stream::{AudioDevice, StreamConfig, YmStream};

    const POSITION_UPDATE_MS: u64 = 200;

    struct Options {
        track_path: Option<String>,
        looping: bool,
        volume: f64,
        export_path: Option<String>,
    }

    fn usage() -> ! {
        eprintln!("Usage: ym-stream [track.notes] [--loop] [--volume <0.0-1.0>] [--export <out.wav>]");
        eprintln!();
        eprintln!("Plays the built-in demo track when no track file is given.");
        std::process::exit(2);
    }

    fn parse_args() -> Result<Options> {
        let mut options = Options {
            track_path: None,
            looping: false,
            volume: StreamConfig::default().volume,
            export_path: None,
        };

        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--loop" => options.looping = true,
                "--volume" => {
                    let value = args.next().unwrap_or_else(|| usage());
                    options.volume = value
                        .parse()
                        .with_context(|| format!("invalid volume: {value}"))?;
                }
                "--export" => {
                    options.export_path = Some(args.next().unwrap_or_else(|| usage()));
                }
                "--help" | "-h" => usage(),
                _ if arg.starts_with('-') => usage(),
                _ if options.track_path.is_none() => options.track_path = Some(arg),
                _ => usage(),
            }
        }
        Ok(options)
    }

    pub fn run() -> Result<()> {
        let options = parse_args()?;

        let data = match &options.track_path {
            Some(path) => fs::read(path).with_context(|| format!("failed to read {path}"))?,
            None => demo_track().to_vec(),
        };

        let config = StreamConfig::default()
            .with_looping(options.looping)
            .with_volume(options.volume);
        let stream =
            YmStream::open::<SoftToneDecoder>(&data, &config).context("failed to load track")?;

        let total_secs = stream.total_samples() as f64 / f64::from(stream.sample_rate());
        println!(
            "Track: {} ({:.1}s{})",
            options.track_path.as_deref().unwrap_or("built-in demo"),
            total_secs,
            if options.looping { ", looping" } else { "" }
        );

        if let Some(path) = &options.export_path {
            #[cfg(feature = "export-wav")]
            {
                ym_stream::export::export_to_wav(&stream, path).context("WAV export failed")?;
                println!("Rendered to {path}");
                return Ok(());
            }
            #[cfg(not(feature = "export-wav"))]
            {
                let _ = path;
                anyhow::bail!("--export requires rebuilding with the export-wav feature");
            }
        }

        // No audio output is not fatal: the host keeps running silently.
        let device = match AudioDevice::new() {
            Ok(device) => device,
            Err(err) => {
                eprintln!("Audio unavailable ({err}); nothing to play.");
                return Ok(());
            }
        };
        device.attach(&stream);

        if options.looping {
            println!("Playing (Ctrl-C to quit)...");
            device.wait_until_end();
            return Ok(());
        }

        while !stream.is_exhausted() {
            let pos_secs = stream.position_samples() as f64 / f64::from(stream.sample_rate());
            print!("\rPlaying {pos_secs:5.1}s / {total_secs:.1}s");
            let _ = io::stdout().flush();
            thread::sleep(Duration::from_millis(POSITION_UPDATE_MS));
        }
        device.wait_until_end();
        println!("\rDone.{:20}", "");
        Ok(())
    }
}

#[cfg(all(feature = "streaming", feature = "softsynth"))]
fn main() -> anyhow::Result<()> {
    cli::run()
}
