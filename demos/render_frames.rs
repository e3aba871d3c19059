use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use glam::{uvec2, vec2};
use tracing::{debug, info};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

use cubism_render::formats::load_scene;
use cubism_render::{Player, PlayerConfig, ScriptedEngine};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
	#[arg(help = "Path to the JSON scene file")]
	scene_path: PathBuf,
	#[arg(short, long, default_value_t = 60, help = "Number of ticks to simulate before saving")]
	ticks: u32,
	#[arg(long, default_value_t = 60)]
	tps: u32,
	#[arg(long, default_value_t = 640)]
	width: u32,
	#[arg(long, default_value_t = 480)]
	height: u32,
	#[arg(long, num_args = 2, value_names = ["X", "Y"], help = "Pointer position in window pixels")]
	pointer: Option<Vec<f32>>,
	#[arg(long, help = "Also save every intermediate frame next to the output")]
	all_frames: bool,
	#[arg(short, long, default_value = "frame.png")]
	output: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();

	tracing_subscriber::registry()
		.with(fmt::layer())
		.with(LevelFilter::INFO)
		.init();

	let config = PlayerConfig {
		ticks_per_second: cli.tps,
		window_size: uvec2(cli.width, cli.height),
		..Default::default()
	};

	info!("Parsing scene");
	let scene = load_scene(&cli.scene_path)?;
	let engine = ScriptedEngine::new(scene, config.ticks_per_second)?;

	let mut player = Player::load(engine, config)?;
	player.set_pointer(cli.pointer.as_deref().map(|p| vec2(p[0], p[1])));

	let mut renderer = player.software_renderer();
	for tick in 0..cli.ticks {
		player.tick()?;

		if cli.all_frames {
			debug!("Drawing tick {}", tick);
			player.draw(&mut renderer);
			let path = cli.output.with_file_name(format!(
				"{}_{:04}.png",
				cli.output.file_stem().and_then(|s| s.to_str()).unwrap_or("frame"),
				tick
			));
			renderer.window_image().save(&path)?;
		}
	}

	player.draw(&mut renderer);
	renderer.window_image().save(&cli.output)?;
	info!(
		"Saved {:?} after {:.2}s of simulated time",
		cli.output,
		player.engine().elapsed()
	);

	Ok(())
}
