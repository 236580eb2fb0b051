//! # Delve Floor Inspector
//!
//! Debug binary: generates one dungeon floor from command-line parameters
//! and prints it as an ASCII map or as the JSON wire representation.

use clap::Parser;
use delve::{generate_floor, Difficulty, DelveResult, Floor, Position, TileType};
use log::info;

/// Command line arguments for the floor inspector.
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(about = "Generate and inspect dungeon floors")]
#[command(version)]
struct Args {
    /// Floor level to generate (1-indexed)
    #[arg(short, long, default_value_t = 1)]
    level: u32,

    /// Floor width in tiles
    #[arg(long, default_value_t = delve::config::DEFAULT_FLOOR_WIDTH)]
    width: u32,

    /// Floor height in tiles
    #[arg(long, default_value_t = delve::config::DEFAULT_FLOOR_HEIGHT)]
    height: u32,

    /// Total floors in the dungeon
    #[arg(long, default_value_t = delve::config::DEFAULT_TOTAL_FLOORS)]
    floors: u32,

    /// Difficulty tier (easy, normal, hard, nightmare)
    #[arg(short, long, default_value = "normal")]
    difficulty: Difficulty,

    /// Dungeon seed
    #[arg(short, long, default_value_t = 42)]
    seed: i64,

    /// Emit the JSON wire representation instead of an ASCII map
    #[arg(long)]
    json: bool,
}

fn main() -> DelveResult<()> {
    env_logger::init();
    let args = Args::parse();

    info!(
        "generating floor {} of {} ({}x{}, {}, seed {})",
        args.level, args.floors, args.width, args.height, args.difficulty, args.seed
    );

    let floor = generate_floor(
        args.level,
        args.width,
        args.height,
        args.difficulty,
        args.seed,
        args.floors,
    )?;

    if args.json {
        println!("{}", floor.to_json()?);
    } else {
        print_ascii(&floor);
        println!(
            "floor {}: {} rooms, {} mobs, {} items, {} up-stairs, {} down-stairs",
            floor.level,
            floor.rooms.len(),
            floor.mobs.len(),
            floor.items.len(),
            floor.up_stairs.len(),
            floor.down_stairs.len()
        );
    }

    Ok(())
}

/// Renders the floor as ASCII, one character per tile.
fn print_ascii(floor: &Floor) {
    for y in 0..floor.height as i32 {
        let mut line = String::with_capacity(floor.width as usize);
        for x in 0..floor.width as i32 {
            let tile = match floor.tile_at(Position::new(x, y)) {
                Some(tile) => tile,
                None => continue,
            };
            let glyph = if tile.mob_id.is_some() {
                'M'
            } else if tile.item_id.is_some() {
                '!'
            } else {
                match tile.tile_type {
                    TileType::Wall => '#',
                    TileType::Floor => '.',
                    TileType::Door => '+',
                    TileType::StairsUp => '<',
                    TileType::StairsDown => '>',
                }
            };
            line.push(glyph);
        }
        println!("{line}");
    }
}
