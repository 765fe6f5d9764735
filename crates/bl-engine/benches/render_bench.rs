//! Render throughput of the full engine path.
//!
//! Run with: cargo bench -p bl-engine
//!
//! At 48 kHz a 512-frame block has a 10.67 ms deadline.

use std::hint::black_box;
use std::sync::Arc;

use bl_dsp::{Adsr, WaveTableBank, Waveform};
use bl_engine::{BeatTrack, EngineCore, Song};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];
const TRACK_COUNTS: &[usize] = &[1, 4, 16];

fn build_song(tracks: usize, bank: &WaveTableBank) -> Arc<Song> {
    let song = Song::new("bench");
    for i in 0..tracks {
        let waveform = Waveform::ALL[i % Waveform::ALL.len()];
        let track = BeatTrack::new(110.0 * (i + 1) as f32, bank.get(waveform))
            .with_envelope(Adsr::new(0.005, 0.05, 0.7, 0.1))
            .with_note_duration(0.4);
        song.add_track(track);
    }
    Arc::new(song)
}

fn bench_render_block(c: &mut Criterion) {
    let bank = WaveTableBank::new();
    let mut group = c.benchmark_group("engine/render_block");

    for &tracks in TRACK_COUNTS {
        for &size in BLOCK_SIZES {
            let (mut core, handle) = EngineCore::new();
            let Ok(()) = core.prepare(size, 48_000.0) else {
                continue;
            };
            handle.load_song(build_song(tracks, &bank));
            handle.play();
            let mut out = vec![0.0f32; size * 2];

            group.bench_with_input(
                BenchmarkId::new(format!("{tracks}_tracks"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        core.render_block(black_box(&mut out), 2);
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_render_block);
criterion_main!(benches);
