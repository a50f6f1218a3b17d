use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use cable_core::{Mask, Point2f};
use cable_skeleton::{Endpoint, ExtractConfig, extract_paths, find_ends};
use cable_stitch::sort_paths;
use cable_track::{
    ChordFitter, FrameContext, FrameErrors, FrameInput, FrameOutcome, SplineParams, TrackConfig,
    track_frame,
};
use clap::{Args, Parser, Subcommand};
use image::{GrayImage, Rgb, RgbImage};
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(name = "cable_gallery")]
#[command(about = "Run cable-observer stages on external mask fixtures")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(name = "endpoints")]
    Endpoints(EndpointsArgs),
    #[command(name = "paths")]
    Paths(PathsArgs),
    #[command(name = "track")]
    Track(TrackArgs),
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Skeleton mask; any pixel > 0 is foreground
    #[arg(long, required = true)]
    input: PathBuf,
    #[arg(long, default_value = "docs/fig/raw")]
    out: PathBuf,
    /// JSON overrides for the stage configuration
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct EndpointsArgs {
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug, Clone)]
struct PathsArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Segmentation mask of the same size; enables the radial walker when
    /// the config sets `radial`
    #[arg(long)]
    foreground: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct TrackArgs {
    /// Skeleton masks, one per frame, in order
    #[arg(long, required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,
    #[arg(long, default_value = "docs/fig/raw")]
    out: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 8)]
    control_points: usize,
}

#[derive(Debug, Clone, Serialize)]
struct EndpointsDto {
    width: usize,
    height: usize,
    endpoints: Vec<Endpoint>,
    branch_points: Vec<Endpoint>,
}

#[derive(Debug, Clone, Serialize)]
struct PathDto {
    length: f32,
    points: Vec<[f32; 2]>,
}

#[derive(Debug, Clone, Serialize)]
struct PathsDto {
    width: usize,
    height: usize,
    /// Paths as walked, before stitching.
    walked: Vec<PathDto>,
    /// Stitched chain, oriented begin to end.
    chain: Vec<PathDto>,
    unreached: Vec<usize>,
    t: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize)]
struct MetaEndpoints {
    max_px_gap: usize,
    pixel_rule: &'static str,
    endpoint_count: usize,
    branch_count: usize,
}

#[derive(Debug, Clone, Serialize)]
struct MetaPaths {
    config: ExtractConfig,
    walker: &'static str,
    walked_count: usize,
    truncated_walks: usize,
    chain_count: usize,
    topology_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct TrackFrameDto {
    frame: u64,
    input: PathBuf,
    outcome: &'static str,
    detail: Option<String>,
    params: Option<SplineParams>,
    errors: Option<FrameErrors>,
}

#[derive(Debug, Clone, Serialize)]
struct MetaTrack {
    config: TrackConfig,
    fitter: ChordFitter,
    frames: usize,
    tracked: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.cmd {
        Command::Endpoints(args) => run_endpoints(args),
        Command::Paths(args) => run_paths(args),
        Command::Track(args) => run_track(args),
    }
}

fn run_endpoints(args: EndpointsArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "endpoints")?;
    let mask = load_mask(&args.common.input)?;
    let cfg: ExtractConfig = load_config(args.common.config.as_deref())?;

    let scan = find_ends(&mask.as_view(), &cfg.endpoints);
    info!(
        "endpoints: {} ends, {} branch points",
        scan.endpoints.len(),
        scan.branch_points.len()
    );

    save_mask(case_dir.join("skeleton_clean.png"), &scan.skeleton)?;

    let mut overlay = mask_to_rgb(&mask)?;
    for e in &scan.branch_points {
        draw_dot(&mut overlay, e.to_point(), Rgb([64, 64, 255]));
    }
    for e in &scan.endpoints {
        draw_dot(&mut overlay, e.to_point(), Rgb([255, 64, 64]));
    }
    overlay
        .save(case_dir.join("overlay.png"))
        .context("writing endpoints overlay.png")?;

    write_json(
        case_dir.join("endpoints.json"),
        &EndpointsDto {
            width: mask.width(),
            height: mask.height(),
            endpoints: scan.endpoints.clone(),
            branch_points: scan.branch_points.clone(),
        },
    )?;
    write_json(
        case_dir.join("meta.json"),
        &MetaEndpoints {
            max_px_gap: cfg.endpoints.max_px_gap,
            pixel_rule: "skeleton pixel set iff value > 0",
            endpoint_count: scan.endpoints.len(),
            branch_count: scan.branch_points.len(),
        },
    )?;

    Ok(())
}

fn run_paths(args: PathsArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "paths")?;
    let mask = load_mask(&args.common.input)?;
    let cfg: ExtractConfig = load_config(args.common.config.as_deref())?;

    let foreground = match &args.foreground {
        Some(path) => {
            ensure_file_exists(path, "foreground")?;
            let fg = load_mask(path)?;
            if fg.width() != mask.width() || fg.height() != mask.height() {
                bail!(
                    "foreground dimensions ({}, {}) do not match skeleton dimensions ({}, {}).",
                    fg.width(),
                    fg.height(),
                    mask.width(),
                    mask.height()
                );
            }
            Some(fg)
        }
        None => None,
    };
    let fg_view = foreground.as_ref().map(Mask::as_view);

    let extracted = extract_paths(&mask.as_view(), fg_view.as_ref(), &cfg)
        .context("extracting paths from skeleton")?;
    let walked: Vec<PathDto> = extracted.paths.iter().map(path_dto).collect();
    let walked_count = extracted.paths.len();

    let (chain, unreached, t, topology_error) = match sort_paths(extracted.paths, &Default::default())
    {
        Ok(seq) => {
            let t = seq.parametrization();
            (seq.paths, seq.unreached, t, None)
        }
        Err(e) => (Vec::new(), Vec::new(), None, Some(e.to_string())),
    };

    let mut overlay = mask_to_rgb(&mask)?;
    for (k, p) in chain.iter().enumerate() {
        let color = chain_color(k);
        for &q in &p.points {
            put(&mut overlay, q, color);
        }
        if let Some(b) = p.begin() {
            draw_dot(&mut overlay, b, Rgb([255, 255, 255]));
        }
    }
    overlay
        .save(case_dir.join("overlay.png"))
        .context("writing paths overlay.png")?;

    write_json(
        case_dir.join("paths.json"),
        &PathsDto {
            width: mask.width(),
            height: mask.height(),
            walked,
            chain: chain.iter().map(path_dto).collect(),
            unreached,
            t,
        },
    )?;
    write_json(
        case_dir.join("meta.json"),
        &MetaPaths {
            config: cfg,
            walker: if fg_view.is_some() && cfg.radial.is_some() {
                "radial"
            } else {
                "thin"
            },
            walked_count,
            truncated_walks: extracted.truncated_walks,
            chain_count: chain.len(),
            topology_error,
        },
    )?;

    Ok(())
}

fn run_track(args: TrackArgs) -> Result<()> {
    for input in &args.inputs {
        ensure_file_exists(input, "input")?;
    }
    let case_dir = args.out.join("track");
    fs::create_dir_all(&case_dir)
        .with_context(|| format!("creating output directory {}", case_dir.display()))?;

    let cfg: TrackConfig = load_config(args.config.as_deref())?;
    let mut fitter = ChordFitter {
        control_points: args.control_points,
    };

    let mut ctx = FrameContext::default();
    let mut frames = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let mask = load_mask(input)?;
        let frame = ctx.frame_index;
        let (next, outcome) = track_frame(
            ctx,
            &FrameInput {
                skeleton: mask.as_view(),
                foreground: None,
            },
            &mut fitter,
            &cfg,
        );
        ctx = next;

        let dto = match outcome {
            FrameOutcome::NoCable => frame_dto(frame, input, "no_cable", None, None, None),
            FrameOutcome::Anomalous(e) => {
                frame_dto(frame, input, "anomalous", Some(e.to_string()), None, None)
            }
            FrameOutcome::Failed(e) => {
                frame_dto(frame, input, "failed", Some(e.to_string()), None, None)
            }
            FrameOutcome::Discontinuous { params, errors, .. } => frame_dto(
                frame,
                input,
                "discontinuous",
                None,
                Some(params),
                Some(errors),
            ),
            FrameOutcome::Tracked { params, errors, .. } => {
                frame_dto(frame, input, "tracked", None, Some(params), errors)
            }
        };
        info!("track: frame {frame} {}", dto.outcome);
        frames.push(dto);
    }

    let tracked = frames.iter().filter(|f| f.outcome == "tracked").count();
    write_json(case_dir.join("track.json"), &frames)?;
    write_json(
        case_dir.join("meta.json"),
        &MetaTrack {
            config: cfg,
            fitter,
            frames: frames.len(),
            tracked,
        },
    )?;

    Ok(())
}

fn frame_dto(
    frame: u64,
    input: &Path,
    outcome: &'static str,
    detail: Option<String>,
    params: Option<SplineParams>,
    errors: Option<FrameErrors>,
) -> TrackFrameDto {
    TrackFrameDto {
        frame,
        input: input.to_path_buf(),
        outcome,
        detail,
        params,
        errors,
    }
}

fn prepare_case(common: &CommonArgs, case_name: &str) -> Result<PathBuf> {
    ensure_file_exists(&common.input, "input")?;
    if let Some(config) = &common.config {
        ensure_file_exists(config, "config")?;
    }

    let case_dir = common.out.join(case_name);
    fs::create_dir_all(&case_dir)
        .with_context(|| format!("creating output directory {}", case_dir.display()))?;

    fs::copy(&common.input, case_dir.join("input.png")).with_context(|| {
        format!(
            "copying input {} -> {}",
            common.input.display(),
            case_dir.join("input.png").display()
        )
    })?;

    Ok(case_dir)
}

fn load_mask(path: &Path) -> Result<Mask> {
    let dyn_img =
        image::open(path).with_context(|| format!("opening input image {}", path.display()))?;
    let luma = dyn_img.to_luma8();
    let (w, h) = luma.dimensions();

    Mask::from_luma(w as usize, h as usize, luma.as_raw())
        .with_context(|| format!("constructing mask from {}", path.display()))
}

/// Stage config from `path`, or the defaults when none is given.
fn load_config<T: Default + for<'de> Deserialize<'de>>(path: Option<&Path>) -> Result<T> {
    match path {
        Some(path) => read_json(path),
        None => Ok(T::default()),
    }
}

fn save_mask(path: PathBuf, mask: &Mask) -> Result<()> {
    let gray = GrayImage::from_raw(mask.width() as u32, mask.height() as u32, mask.to_luma())
        .context("constructing GrayImage from mask")?;
    gray.save(&path)
        .with_context(|| format!("saving image {}", path.display()))
}

fn mask_to_rgb(mask: &Mask) -> Result<RgbImage> {
    let dimmed = mask.to_luma().into_iter().map(|v| v / 3).collect();
    let gray = GrayImage::from_raw(mask.width() as u32, mask.height() as u32, dimmed)
        .context("constructing GrayImage from mask")?;
    Ok(image::DynamicImage::ImageLuma8(gray).to_rgb8())
}

fn path_dto(p: &cable_skeleton::Path) -> PathDto {
    PathDto {
        length: p.length,
        points: p.points.iter().map(|q| [q.x, q.y]).collect(),
    }
}

fn chain_color(k: usize) -> Rgb<u8> {
    const PALETTE: [[u8; 3]; 4] = [[255, 96, 64], [64, 220, 96], [255, 200, 64], [200, 96, 255]];
    Rgb(PALETTE[k % PALETTE.len()])
}

fn put(img: &mut RgbImage, p: Point2f, color: Rgb<u8>) {
    let Some((x, y)) = p.round_to_pixel() else {
        return;
    };
    let (ux, uy) = (x as u32, y as u32);
    if ux < img.width() && uy < img.height() {
        img.put_pixel(ux, uy, color);
    }
}

fn draw_dot(img: &mut RgbImage, p: Point2f, color: Rgb<u8>) {
    for dy in -1..=1 {
        for dx in -1..=1 {
            put(
                img,
                Point2f::new(p.x + dx as f32, p.y + dy as f32),
                color,
            );
        }
    }
}

fn write_json(path: PathBuf, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(&path, bytes).with_context(|| format!("writing json {}", path.display()))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing json {}", path.display()))
}

fn ensure_file_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} file does not exist: {}", what, path.display());
    }
    if !path.is_file() {
        bail!("{} path is not a file: {}", what, path.display());
    }
    Ok(())
}
