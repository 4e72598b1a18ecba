use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_logger::{DataLogger, FieldId, LoggerConfig};
use log::{info, LevelFilter};
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};
use std::io;
use std::sync::Once;
use std::time::Instant;
use tempfile::tempdir;

const TIMESTEPS: usize = 10_000;
const JOINTS: usize = 12;

static LOGGER_INIT: Once = Once::new();

fn setup_log4rs(log_file: &str) {
    LOGGER_INIT.call_once(|| {
        let logfile = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new("{d} - {m}{n}")))
            .append(true)
            .build(log_file)
            .unwrap();

        let config = Config::builder()
            .appender(Appender::builder().build("logfile", Box::new(logfile)))
            .build(Root::builder().appender("logfile").build(LevelFilter::Info))
            .unwrap();

        log4rs::init_config(config).unwrap();
    });
}

fn robot_logger<W: data_logger::Sink>(sink: W) -> (DataLogger<W>, [FieldId; 3]) {
    let mut logger = DataLogger::with_writer(sink, LoggerConfig::default()).unwrap();
    let fields = [
        logger.add_field("joint_positions", JOINTS as u32).unwrap(),
        logger.add_field("joint_velocities", JOINTS as u32).unwrap(),
        logger.add_field("joint_torques", JOINTS as u32).unwrap(),
    ];
    (logger, fields)
}

fn sample(step: usize, phase: f64) -> [f64; JOINTS] {
    let mut out = [0.0; JOINTS];
    for (j, v) in out.iter_mut().enumerate() {
        *v = ((step as f64) * 0.001 + j as f64 * phase).sin();
    }
    out
}

fn bench_hot_path(c: &mut Criterion) {
    let (mut logger, fields) = robot_logger(io::sink());
    logger.begin_timestep().unwrap();
    let values = sample(1, 0.3);

    c.bench_function("log_three_fields", |b| {
        b.iter(|| {
            for &field in &fields {
                logger.log(field, black_box(&values[..])).unwrap();
            }
        })
    });
}

fn bench_full_timestep(c: &mut Criterion) {
    let (mut logger, fields) = robot_logger(io::sink());
    let mut step = 0usize;

    c.bench_function("full_timestep", |b| {
        b.iter(|| {
            step += 1;
            logger.begin_timestep().unwrap();
            logger.log(fields[0], &sample(step, 0.1)).unwrap();
            logger.log(fields[1], &sample(step, 0.2)).unwrap();
            logger.log(fields[2], &sample(step, 0.3)).unwrap();
            logger.end_timestep().unwrap();
        })
    });
}

fn bench_logging_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("Logging Comparison");
    group.sample_size(10);

    group.bench_function("binary_vs_text", |b| {
        b.iter(|| {
            let dir = tempdir().unwrap();

            let binary_path = dir.path().join("robot.mds");
            let binary_start = Instant::now();
            {
                let mut logger = DataLogger::create(&binary_path).unwrap();
                let pos = logger.add_field("joint_positions", JOINTS as u32).unwrap();
                for step in 0..TIMESTEPS {
                    logger.begin_timestep().unwrap();
                    logger.log(pos, &sample(step, 0.1)).unwrap();
                    logger.end_timestep().unwrap();
                }
                logger.close_file().unwrap();
            }
            let binary_duration = binary_start.elapsed();

            let text_path = dir.path().join("robot.log");
            setup_log4rs(text_path.to_str().unwrap());
            let text_start = Instant::now();
            for step in 0..TIMESTEPS {
                info!("step={} joint_positions={:?}", step, sample(step, 0.1));
            }
            let text_duration = text_start.elapsed();

            let binary_size = std::fs::metadata(&binary_path).map(|m| m.len()).unwrap_or(0);
            println!("\nPerformance comparison ({} timesteps):", TIMESTEPS);
            println!("Binary logging: {:?} ({} bytes)", binary_duration, binary_size);
            println!("Text logging: {:?}", text_duration);
            println!(
                "Speedup: {:.2}x",
                text_duration.as_secs_f64() / binary_duration.as_secs_f64()
            );

            black_box((binary_duration, text_duration))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_hot_path, bench_full_timestep, bench_logging_comparison);
criterion_main!(benches);
