use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args as ClapArgs, Parser, Subcommand};
use lunamesh_cli::commands::{self, CommandError, Simulate};
use lunamesh_cli::config::PigeonConfig;
use lunamesh_delivery::{Destination, PigeonMailForm};
use lunamesh_geo::Coordinate;
use lunamesh_pigeon::NodeId;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "pigeon", about = "Compose, encode and dry-run pigeon mail deliveries")]
struct Args {
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Default log filter when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate and encode a pigeon mail without sending it.
    Encode(FormArgs),
    /// Decode a `!BIN!` envelope or a hex dump.
    Decode { input: String },
    /// Submit a pigeon mail through the loopback transport.
    Send {
        #[command(flatten)]
        form: FormArgs,
        #[arg(long, value_enum, default_value = "ack")]
        simulate: Simulate,
    },
    /// Send a plain chat message through the loopback transport.
    Chat {
        text: String,
        /// Direct destination; broadcast when omitted.
        #[arg(long)]
        to: Option<NodeId>,
        #[arg(long, default_value_t = 0)]
        channel: u8,
        #[arg(long, value_enum, default_value = "ack")]
        simulate: Simulate,
    },
    /// Great-circle distance between two points and the radius verdict.
    Distance {
        #[arg(long, allow_negative_numbers = true)]
        from_lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        from_lon: f64,
        #[arg(long, allow_negative_numbers = true)]
        to_lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        to_lon: f64,
    },
}

#[derive(ClapArgs, Debug)]
struct FormArgs {
    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    lon: Option<f64>,
    #[arg(long)]
    alt: Option<f64>,
    #[arg(long, default_value = "")]
    text: String,
    #[arg(long)]
    recipient: Option<String>,
    #[arg(long)]
    drone: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    channel: Option<i64>,
    /// Operator latitude for the radius gate.
    #[arg(long, allow_negative_numbers = true, requires = "ref_lon")]
    ref_lat: Option<f64>,
    #[arg(long, allow_negative_numbers = true, requires = "ref_lat")]
    ref_lon: Option<f64>,
}

impl FormArgs {
    fn form(&self, config: &PigeonConfig) -> PigeonMailForm {
        let mut form = config.form();
        form.latitude = self.lat;
        form.longitude = self.lon;
        form.text = self.text.clone();
        if let Some(alt) = self.alt {
            form.altitude = alt;
        }
        if let Some(recipient) = &self.recipient {
            form.recipient_node_id = recipient.clone();
        }
        if let Some(drone) = &self.drone {
            form.drone_node_id = drone.clone();
        }
        if let Some(channel) = self.channel {
            form.channel = channel;
        }
        form
    }

    fn reference(&self, config: &PigeonConfig) -> Option<Coordinate> {
        match (self.ref_lat, self.ref_lon) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => config.reference_fix().map(|fix| fix.coordinate),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("[pigeon] {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), CommandError> {
    let config = match &args.config {
        Some(path) => {
            let config = PigeonConfig::from_path(path)?;
            log::info!("[pigeon] loaded config from {}", path.display());
            config
        }
        None => {
            log::debug!("[pigeon] no config file, using built-in defaults");
            PigeonConfig::default()
        }
    };

    match args.command {
        Command::Encode(form_args) => {
            let report = commands::encode(&form_args.form(&config), form_args.reference(&config))?;
            print_json(&report)
        }
        Command::Decode { input } => print_json(&commands::decode(&input)?),
        Command::Send { form, simulate } => {
            let report = commands::send_pigeon_mail(
                simulate,
                config.tracker(),
                &form.form(&config),
                form.reference(&config),
            )
            .await?;
            print_json(&report)
        }
        Command::Chat { text, to, channel, simulate } => {
            let destination = to.map_or(Destination::Broadcast, Destination::from);
            let report = commands::send_chat(
                simulate,
                config.tracker(),
                destination,
                channel,
                config.chat.max_bytes,
                &text,
            )
            .await?;
            print_json(&report)
        }
        Command::Distance { from_lat, from_lon, to_lat, to_lon } => {
            let report = commands::distance(
                Coordinate::new(from_lat, from_lon),
                Coordinate::new(to_lat, to_lon),
            );
            print_json(&report)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
