use VOX_BEND::pitch::interpolation::Kernel;
use VOX_BEND::{Args, Converter, ImportOptions, VibratoConfig, import_midi_file, parse_policy, parse_target};
use anyhow::{Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, info};
use std::fs;

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    let target = parse_target(&args.target);
    let options = ImportOptions {
        transpose_semitones: args.transpose,
        policy: (!args.strict).then(|| parse_policy(&args.policy)),
        channel: args.channel,
    };

    info!("Importing MIDI file: '{}'...", args.midi.display());
    let mut song = import_midi_file(&args.midi, options)?;

    debug!(
        "Imported song '{}' with {} notes, {} tempo changes and {} pitch points..!",
        song.metadata
            .title
            .clone()
            .unwrap_or_else(|| "<unknown>".into()),
        song.notes.len(),
        song.tempos.len(),
        song.pitch.len()
    );

    if args.dry_run {
        info!("Previewing at most {} notes..!", args.dry_run_max);
        for (i, note) in song.notes.iter().enumerate().take(args.dry_run_max) {
            info!(
                "Note {}: key={} ticks={}..{} lyric='{}'",
                i, note.key, note.tick_on, note.tick_off, note.lyric
            );
        }
        return Ok(());
    }

    let kernel = args.interpolation.as_deref().map(Kernel::from_mode);
    let shaping = match (&args.vibrato_config, kernel) {
        (Some(path), kernel) => {
            let config = VibratoConfig::load(path)?;
            config.apply_overrides(&mut song);
            Some(config.shaping(kernel.unwrap_or_default()))
        }
        (None, Some(kernel)) => Some(VibratoConfig::default().shaping(kernel)),
        (None, None) => None,
    };

    let converter = Converter::new(shaping);
    if let Some(shaping) = converter.shaping() {
        info!("Shaping pitch with {:?} interpolation and vibrato..!", shaping.kernel);
    }

    let conversion = converter.convert(&song, target)?;

    if let Some(flat) = &conversion.flat {
        info!("Flat curve: {} points..!", flat.points.len());
    }
    if let Some(sectioned) = &conversion.sectioned {
        info!(
            "Sectioned curve: {} pitch bend events, {} sensitivity changes..!",
            sectioned.pitch_bend.len(),
            sectioned.pitch_bend_sensitivity.len()
        );
    }

    let json = serde_json::to_string_pretty(&conversion)?;
    match &args.output {
        Some(path) => {
            fs::write(path, json)
                .map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))?;
            info!("Wrote pitch curves to '{}'..!", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
