use chrono::{Local, NaiveDateTime};
use clap::Parser;
use dashboard::{advice, client::user_facing_error, inputs, ApiClient, ChargingInputs, Report};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dashboard", about = "Carbon-Smart EV Charging Advisor")]
struct Args {
    /// Arrival hour (0-23)
    #[arg(long, default_value_t = inputs::DEFAULT_ARRIVAL_HOUR, value_parser = clap::value_parser!(u8).range(0..=23))]
    arrival_hour: u8,

    /// Charging duration in hours (1-10)
    #[arg(long, default_value_t = inputs::DEFAULT_DURATION, value_parser = inputs::parse_duration)]
    charging_duration: f64,

    /// Energy required in kWh (5-100)
    #[arg(long, default_value_t = inputs::DEFAULT_ENERGY, value_parser = inputs::parse_energy)]
    energy_consumed: f64,

    /// Charging start time, ISO-8601 [default: now]
    #[arg(long, value_parser = inputs::parse_start_time)]
    start_time: Option<NaiveDateTime>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let inputs = ChargingInputs {
        arrival_hour: args.arrival_hour,
        charging_duration: args.charging_duration,
        energy_consumed: args.energy_consumed,
        start_time: args.start_time.unwrap_or_else(|| Local::now().naive_local()),
    };

    let client = ApiClient::new();
    let analysis = match client.analyze(&inputs).await {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{}", user_facing_error(&e));
            return ExitCode::FAILURE;
        }
    };

    let hourly = advice::random_hourly_intensity(&mut rand::thread_rng());
    print!(
        "{}",
        Report {
            inputs: &inputs,
            analysis: &analysis,
            hourly_intensity: &hourly,
        }
    );
    ExitCode::SUCCESS
}
