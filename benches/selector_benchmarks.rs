use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vidgrab::extractor::StreamVariant;
use vidgrab::selector::{best_audio, build_menu, quality_rank};
use vidgrab::utils::{sanitize_filename, SelectionPolicy};

const LABELS: [&str; 8] = ["2160p", "1440p", "1080p60", "1080p", "720p", "480p", "360p", "144p"];
const CONTAINERS: [&str; 3] = ["mp4", "webm", "m4a"];

fn synthetic_variants(count: usize) -> Vec<StreamVariant> {
    (0..count)
        .map(|i| {
            let has_video = i % 3 != 2;
            let has_audio = i % 3 != 1;
            StreamVariant {
                id: i.to_string(),
                quality: "unknown".to_string(),
                quality_label: has_video.then(|| LABELS[i % LABELS.len()].to_string()),
                container: CONTAINERS[i % CONTAINERS.len()].to_string(),
                has_video,
                has_audio,
                size: Some(1_000_000 + i as u64 * 4096),
                audio_bitrate: (!has_video).then_some(48.0 + (i % 5) as f32 * 32.0),
            }
        })
        .collect()
}

fn benchmark_build_menu(c: &mut Criterion) {
    let mut group = c.benchmark_group("Format Menu");
    let policy = SelectionPolicy::default();

    for count in [10usize, 40, 200] {
        let variants = synthetic_variants(count);
        group.bench_with_input(BenchmarkId::new("build_menu", count), &variants, |b, variants| {
            b.iter(|| build_menu(black_box(variants), black_box(&policy)))
        });
        group.bench_with_input(BenchmarkId::new("best_audio", count), &variants, |b, variants| {
            b.iter(|| best_audio(black_box(variants)))
        });
    }

    group.finish();
}

fn benchmark_quality_rank(c: &mut Criterion) {
    c.bench_function("quality_rank", |b| {
        b.iter(|| {
            LABELS
                .iter()
                .map(|l| quality_rank(black_box(l)) as u32)
                .sum::<u32>()
        })
    });
}

fn benchmark_sanitize(c: &mut Criterion) {
    let mut group = c.benchmark_group("Filename Sanitizing");
    let titles = [
        ("short", "My Video".to_string()),
        ("symbols", "Live: \"Q&A\" <part 1/2> | what?*".to_string()),
        ("long", "a very long title ".repeat(40)),
    ];

    for (name, title) in &titles {
        group.bench_with_input(BenchmarkId::new("sanitize_filename", name), title, |b, title| {
            b.iter(|| sanitize_filename(black_box(title)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_build_menu,
    benchmark_quality_rank,
    benchmark_sanitize
);
criterion_main!(benches);
