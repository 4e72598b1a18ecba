use data_logger::{DataLogger, LogReader};
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

fn main() -> data_logger::Result<()> {
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_timer(UtcTime::rfc_3339())
        .with_writer(writer)
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "output.mds".to_string());

    let mut logger = DataLogger::create(&path)?;
    let joint_positions = logger.add_field("joint_positions", 4)?;
    let joint_velocities = logger.add_field("joint_velocities", 6)?;
    let slider_positions = logger.add_field("slider_positions", 2)?;

    logger.begin_timestep()?;
    logger.log(joint_positions, &[1.0, 2.0, 3.0, 4.0])?;
    logger.log(joint_velocities, &[5.0, 6.0, 7.0, 8.0, 9.0, 10.0])?;
    logger.log(slider_positions, &[11.0, 12.0])?;
    logger.end_timestep()?;
    logger.close_file()?;

    let mut reader = LogReader::open(&path)?;
    for field in reader.fields() {
        info!(name = %field.name(), width = field.width(), "field");
    }
    while let Some(frame) = reader.read_timestep()? {
        info!(step = reader.timesteps_read(), values = ?frame, "timestep");
    }
    Ok(())
}
