//! trackwalk CLI - PCB track tracing from the command line.

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;
use trackwalk::{
    Board, LayerId, NetReport, Point, SnapContext, SnapReport, Size2D, Tool, TrackConfig, TrackOptions, TrackReport,
    TrackWalkCore, TrackWalkError,
};

#[derive(Parser)]
#[command(name = "trackwalk")]
#[command(about = "PCB connectivity and track tracing tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select the track containing a segment and report it
    Track {
        /// Board description file
        #[arg(value_name = "BOARD")]
        board: PathBuf,

        /// Uuid of any segment or via of the track
        #[arg(short, long)]
        segment: String,

        /// Relink the segment list so the track is contiguous
        #[arg(long)]
        reorder: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Delete the track containing a segment
    Delete {
        /// Board description file
        #[arg(value_name = "BOARD")]
        board: PathBuf,

        /// Uuid of any segment or via of the track
        #[arg(short, long)]
        segment: String,

        /// Write the edited board here
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Report copper islands per net
    Nets {
        /// Board description file
        #[arg(value_name = "BOARD")]
        board: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Show the segments connected to each end of a segment
    Links {
        /// Board description file
        #[arg(value_name = "BOARD")]
        board: PathBuf,

        /// Segment uuid
        #[arg(short, long)]
        segment: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Compute where the cursor snaps
    Snap {
        /// Board description file
        #[arg(value_name = "BOARD")]
        board: PathBuf,

        #[arg(short, long, allow_hyphen_values = true)]
        x: i64,

        #[arg(short, long, allow_hyphen_values = true)]
        y: i64,

        /// Active layer name (F.Cu, In1.Cu, B.Cu, ...)
        #[arg(short, long, default_value = "F.Cu")]
        layer: String,

        /// Active tool
        #[arg(short, long, value_enum, default_value = "select")]
        tool: ToolArg,

        /// Uuid of the segment being drawn
        #[arg(long)]
        current: Option<String>,

        /// Grid step
        #[arg(short, long, default_value_t = 1)]
        grid: i64,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ToolArg {
    Select,
    Track,
}

impl From<ToolArg> for Tool {
    fn from(tool: ToolArg) -> Self {
        match tool {
            ToolArg::Select => Tool::Select,
            ToolArg::Track => Tool::Track,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let exit_code = match cli.command {
        Commands::Track {
            board,
            segment,
            reorder,
            format,
        } => handle_track(&board, &segment, reorder, &config, format),
        Commands::Delete {
            board,
            segment,
            output,
            format,
        } => handle_delete(&board, &segment, output.as_deref(), format),
        Commands::Nets { board, format } => handle_nets(&board, format),
        Commands::Links { board, segment, format } => handle_links(&board, &segment, &config, format),
        Commands::Snap {
            board,
            x,
            y,
            layer,
            tool,
            current,
            grid,
            format,
        } => {
            let request = SnapRequest {
                cursor: Point::new(x, y),
                layer,
                tool: tool.into(),
                current,
                grid,
            };
            handle_snap(&board, &request, &config, format)
        }
    };

    process::exit(exit_code);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<TrackConfig, TrackWalkError> {
    match path {
        Some(path) => TrackConfig::load(path),
        None => Ok(TrackConfig::default()),
    }
}

fn report_error(e: TrackWalkError) -> i32 {
    eprintln!("Error: {}", e);
    1
}

fn handle_track(board_path: &Path, segment: &str, reorder: bool, config: &TrackConfig, format: OutputFormat) -> i32 {
    let mut options = TrackOptions::from(config);
    options.reorder |= reorder;

    let result = TrackWalkCore::load_board(board_path)
        .and_then(|mut board| TrackWalkCore::select_track(&mut board, segment, &options));
    match result {
        Ok(report) => {
            match format {
                OutputFormat::Human => output_track(&report, "Track"),
                OutputFormat::Json => print_json(&report),
            }
            0
        }
        Err(e) => report_error(e),
    }
}

fn handle_delete(board_path: &Path, segment: &str, output: Option<&Path>, format: OutputFormat) -> i32 {
    let result = TrackWalkCore::load_board(board_path).and_then(|mut board| {
        let report = TrackWalkCore::delete_track(&mut board, segment)?;
        if let Some(path) = output {
            TrackWalkCore::save_board(&board, path)?;
        }
        Ok(report)
    });
    match result {
        Ok(report) => {
            match format {
                OutputFormat::Human => output_track(&report, "Deleted track"),
                OutputFormat::Json => print_json(&report),
            }
            0
        }
        Err(e) => report_error(e),
    }
}

fn handle_nets(board_path: &Path, format: OutputFormat) -> i32 {
    match TrackWalkCore::load_board(board_path) {
        Ok(board) => {
            let nets = TrackWalkCore::net_report(&board);
            match format {
                OutputFormat::Human => output_nets(&board, &nets),
                OutputFormat::Json => print_json(&nets),
            }
            0
        }
        Err(e) => report_error(e),
    }
}

fn handle_links(board_path: &Path, segment: &str, config: &TrackConfig, format: OutputFormat) -> i32 {
    let result = TrackWalkCore::load_board(board_path)
        .and_then(|board| TrackWalkCore::links(&board, segment, config.neighbor_window));
    match result {
        Ok(links) => {
            match format {
                OutputFormat::Human => {
                    let show = |side: &Option<String>| side.clone().unwrap_or_else(|| "-".to_string());
                    println!("\nSegment: {}", links.segment);
                    println!("  start: {}", show(&links.start));
                    println!("  end:   {}", show(&links.end));
                }
                OutputFormat::Json => print_json(&links),
            }
            0
        }
        Err(e) => report_error(e),
    }
}

struct SnapRequest {
    cursor: Point,
    layer: String,
    tool: Tool,
    current: Option<String>,
    grid: i64,
}

fn snap_context(board: &Board, request: &SnapRequest) -> Result<SnapContext, TrackWalkError> {
    let layer = LayerId::parse(&request.layer, board.copper_layers)
        .filter(|layer| layer.is_copper())
        .ok_or_else(|| TrackWalkError::Other(format!("Unknown copper layer '{}'", request.layer)))?;
    let mut ctx = SnapContext::new(request.cursor, layer, Size2D::square(request.grid)).with_tool(request.tool);
    if let Some(uuid) = &request.current {
        let id = board
            .store
            .find_by_uuid(uuid)
            .ok_or_else(|| TrackWalkError::UnknownSegment(uuid.clone()))?;
        ctx = ctx.with_current_track(id);
    }
    Ok(ctx)
}

fn handle_snap(board_path: &Path, request: &SnapRequest, config: &TrackConfig, format: OutputFormat) -> i32 {
    let result = TrackWalkCore::load_board(board_path).and_then(|board| {
        let ctx = snap_context(&board, request)?;
        Ok(TrackWalkCore::snap(&board, &ctx, &config.magnetic))
    });
    match result {
        Ok(report) => {
            match format {
                OutputFormat::Human => output_snap(&report),
                OutputFormat::Json => print_json(&report),
            }
            0
        }
        Err(e) => report_error(e),
    }
}

fn output_track(report: &TrackReport, title: &str) {
    println!("\n{}: {} (board {})", title, report.reference, report.board);
    println!("{}", "─".repeat(60));

    for segment in &report.segments {
        println!(
            "  {:<5} {:<36} {:<12} {} -> {}",
            segment.kind, segment.uuid, segment.layer, segment.start, segment.end
        );
    }

    println!("\n  Ends:");
    for end in &report.ends {
        match (&end.pad, end.branches) {
            (Some(pad), _) => println!("    {} at {}", pad, end.point),
            (None, Some(branches)) => println!("    junction of {} at {}", branches, end.point),
            (None, None) => println!("    {} at {}", end.kind, end.point),
        }
    }

    println!("\n  Summary:");
    println!("    Segments:   {}", report.count);
    println!("    First:      {}", report.first);
    println!("    Length:     {}", report.length);
    println!("    Die length: {}", report.die_length);
    println!("    Total:      {}", report.total_length());
}

fn output_nets(board: &Board, nets: &[NetReport]) {
    println!("\nBoard: {}", board.name);
    println!("{}", "─".repeat(60));

    if nets.is_empty() {
        println!("  No routed nets");
        return;
    }

    for net in nets {
        let name = net.name.as_deref().unwrap_or("<unnamed>");
        let status = if net.routed { "routed" } else { "open" };
        println!("  net {} {}: {} island(s), {}", net.net, name, net.islands.len(), status);
        if !net.routed {
            for (i, island) in net.islands.iter().enumerate() {
                println!(
                    "    island {}: {} segment(s), pads [{}]",
                    i + 1,
                    island.segments.len(),
                    island.pads.join(", ")
                );
            }
        }
    }
}

fn output_snap(report: &SnapReport) {
    match &report.target {
        Some(target) => println!("Snapped to {} ({})", report.point, target),
        None => println!("No snap, cursor stays at {}", report.point),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: {}", e),
    }
}
