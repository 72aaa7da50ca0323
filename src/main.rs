use clap::{Arg, ArgAction, Command};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{self, AsyncRead, BufReader};

use agentwire::logging::*;
use agentwire::protocol::codec::{parse_frame, to_frame};
use agentwire::transport::{ChannelTransport, LineFrameSource};
use agentwire::{AgentClient, ClientConfig};

fn verbosity_filter(verbose: u8, configured: &str) -> String {
	match verbose {
		0 => configured.to_string(),
		1 => "agentwire=debug".to_string(),
		_ => "agentwire=trace".to_string(),
	}
}

async fn replay(config: &ClientConfig, input: Option<&str>) -> Result<(), Box<dyn Error>> {
	let reader: Box<dyn AsyncRead + Unpin + Send> = match input {
		None | Some("-") => Box::new(io::stdin()),
		Some(file) => Box::new(tokio::fs::File::open(file).await?),
	};
	let mut source = LineFrameSource::new(BufReader::new(reader));

	let (transport, mut outbound) = ChannelTransport::channel();
	let client = AgentClient::new(config, Arc::new(transport));
	let mut events = client.subscribe();

	let frames = client.run(&mut source).await?;

	for event in events.drain() {
		println!("{:?}", event);
	}
	while let Ok(frame) = outbound.try_recv() {
		println!(">> {}", frame);
	}

	let snapshot = client.snapshot().await;
	info!(
		"Replayed {} frame(s): {} dispatched, {} rejected",
		frames, snapshot.frames_dispatched, snapshot.frames_rejected
	);
	Ok(())
}

fn encode(json: &str) -> Result<(), Box<dyn Error>> {
	let payload = parse_frame(json)?;
	let command = agentwire::Command::from_payload(&payload)?;
	println!("{}", to_frame(command.to_payload()));
	Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
	let matches = Command::new("agentwire")
		.version("0.1.0")
		.author("Szilard Hajba <szilu@symbion.hu>")
		.about("Coding-agent protocol client tools")
		.subcommand_required(true)
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("FILE")
				.help("Config file (.toml, .json or .json5)"),
		)
		.arg(
			Arg::new("verbose")
				.short('v')
				.long("verbose")
				.action(ArgAction::Count)
				.help("More logging (-v debug, -vv trace)"),
		)
		.subcommand(
			Command::new("replay")
				.about("Feed newline-delimited server frames through the client and print the events")
				.arg(Arg::new("file").help("Frame file, or - for stdin")),
		)
		.subcommand(
			Command::new("encode")
				.about("Validate a JSON command and print its canonical wire form")
				.arg(Arg::new("json").required(true)),
		)
		.get_matches();

	let config_path = matches.get_one::<String>("config").map(PathBuf::from);
	let config = ClientConfig::load(config_path.as_deref())?;
	let verbose = matches.get_count("verbose");
	init_tracing(&verbosity_filter(verbose, &config.log_filter));
	debug!(
		"Auth token {}, auto-authenticate {}",
		if config.auth_token.is_some() { "set" } else { "not set" },
		config.auto_authenticate
	);

	if let Some(sub_matches) = matches.subcommand_matches("replay") {
		replay(&config, sub_matches.get_one::<String>("file").map(|s| s.as_str())).await?;
	} else if let Some(sub_matches) = matches.subcommand_matches("encode") {
		let json = sub_matches.get_one::<String>("json").ok_or("encode: JSON argument required")?;
		encode(json)?;
	}

	Ok(())
}

// vim: ts=4
