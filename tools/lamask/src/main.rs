//! lamask -- 从断层体积计算 lamella 二值掩膜的命令行工具.
//!
//! 自动模式 (默认) 从体积自身估计上下边界; 提供 `--points` 时切换到
//! 手动模式, 由控制点表直接拟合. 掩膜先完整算出, 之后才写任何文件.

use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{info, LevelFilter};

use et_berry::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "lamask")]
#[command(about = "Estimate lamella boundaries and rasterize a binary mask", long_about = None)]
struct Cli {
    /// 输入体积 (.nii / .nii.gz).
    #[arg(short, long)]
    input: PathBuf,

    /// 掩膜输出路径.
    #[arg(short, long)]
    output: PathBuf,

    /// 体积与掩膜逐体素乘积的输出路径 (可选).
    #[arg(long)]
    masked_output: Option<PathBuf>,

    /// 手动模式控制点表. 每行一个点, 取最后三列作为 (x, y, z),
    /// 点数须为 4 的倍数.
    #[arg(short, long)]
    points: Option<PathBuf>,

    /// 每个水平切片清零的边框宽度 (体素).
    #[arg(long, default_value_t = 0)]
    border: usize,

    /// 对称 z 偏移 (体素). 为正时掩膜向外扩张.
    #[arg(long, default_value_t = 0.0)]
    z_offset: f64,

    /// 测量厚度并打印到标准输出.
    #[arg(long)]
    measure: bool,

    /// 厚度换算用的像素尺寸. 缺省取输入文件 header 的声明值.
    #[arg(long)]
    pixel_size: Option<f64>,

    /// 自动模式: 随机采样点个数.
    #[arg(long, default_value_t = et_berry::consts::DEFAULT_SAMPLE_COUNT)]
    samples: u32,

    /// 自动模式: 局部方差邻域盒边长 (体素).
    #[arg(long, default_value_t = et_berry::consts::DEFAULT_BOX_SIZE)]
    box_size: usize,

    /// 自动模式: 高级模式精化迭代次数.
    #[arg(long, default_value_t = et_berry::consts::DEFAULT_ITERATIONS)]
    iterations: u32,

    /// 自动模式: 使用简单模式 (中心平面 ± 厚度 / 2).
    #[arg(long)]
    simple: bool,

    /// 简单模式的 lamella 总厚度 (体素). 缺省为体积 z 长度的一半.
    #[arg(long)]
    thickness: Option<f64>,

    /// 自动模式: 方差百分位阈值 (百分比).
    #[arg(long, default_value_t = et_berry::consts::DEFAULT_PERCENTILE)]
    percentile: f64,

    /// 自动模式: 随机数种子.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// 打印调试日志.
    #[arg(short, long)]
    verbose: bool,
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let tomo = Tomogram::open(&cli.input)?;
    let shape = tomo.shape();
    info!("loaded {:?}, shape (z, H, W) = {:?}", cli.input, shape);

    let pair = match &cli.points {
        Some(path) => {
            let reader = BufReader::new(File::open(path)?);
            let pts = ControlPointSet::from_reader(reader)?;
            info!("manual mode with {} control points", pts.len());
            manual_boundaries(&pts, shape, cli.z_offset)?
        }
        None => {
            let params = RefineParams {
                samples: cli.samples,
                box_size: cli.box_size,
                iterations: cli.iterations,
                simple: cli.simple,
                thickness: cli.thickness,
                percentile: cli.percentile,
                z_offset: cli.z_offset,
                seed: cli.seed,
            };
            refine_boundaries(tomo.data(), &params)?
        }
    };

    let mut mask = LamellaMask::rasterize(shape, &pair);
    mask.zero_border(cli.border);
    info!("mask ready, {} voxels included", mask.count_included());

    // 掩膜已在内存中算完, 从这里开始才接触输出文件.
    tomo.save_mask(&cli.output, &mask)?;
    info!("mask written to {:?}", cli.output);

    if let Some(path) = &cli.masked_output {
        let product = mask.apply(tomo.data());
        tomo.save_volume(path, &product)?;
        info!("masked volume written to {:?}", path);
    }

    if cli.measure {
        let pixel_size = cli.pixel_size.or_else(|| {
            let p = tomo.pixel_size();
            (p > 0.0).then_some(p)
        });
        let report = mask.thickness_at(None, cli.z_offset, pixel_size);
        let unit = if pixel_size.is_some() { "" } else { " voxels" };
        println!("thickness (with z offset): {:.3}{unit}", report.with_offset);
        println!(
            "thickness (offset reversed): {:.3}{unit}",
            report.without_offset
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if simple_logger::SimpleLogger::new().with_level(level).init().is_err() {
        eprintln!("warning: logger already initialized");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("lamask: {e}");
            ExitCode::FAILURE
        }
    }
}
