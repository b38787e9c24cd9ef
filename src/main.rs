use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use komauchi::config::AnalysisConfig;
use komauchi::error::AnalysisError;
use komauchi::pipeline::{process_clip, ProcessOptions, ProcessOutcome};
use komauchi::pose::MoveNetEstimator;
use komauchi::store::JsonFileStore;

/// 2Dアニメのコマ打ち再タイミングツール
///
/// 動画からモーション強度を解析し、HIGH区間を2コマ打ち、MID区間を
/// 3コマ打ちに再構成した動画と解析ドキュメントを書き出す。
#[derive(Parser)]
#[command(
    name = "komauchi",
    about = "Motion-intensity based frame re-timer for 2D animation",
    version = env!("GIT_VERSION")
)]
struct Cli {
    /// 入力動画のパス
    #[arg(long)]
    input: PathBuf,

    /// 出力動画のパス
    #[arg(long)]
    output: PathBuf,

    /// 解析パラメータ（JSONオブジェクト文字列）
    #[arg(long)]
    config: String,

    /// 解析ドキュメントの保存先（デフォルト: 出力動画の隣）
    #[arg(long)]
    db: Option<PathBuf>,

    /// 姿勢推定ONNXモデルのパス
    #[arg(long, default_value = "movenet.onnx")]
    model: PathBuf,

    /// フレームごとのMIをCSVで標準出力に出す（デバッグ用）
    #[arg(long)]
    dump_mi: bool,

    /// デバッグログを有効化
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "komauchi=debug" } else { "komauchi=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    // JSONコントラクトを汚さないようにログはstderrへ
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> std::result::Result<ProcessOutcome, AnalysisError> {
    let config = AnalysisConfig::from_json_str(&cli.config)?;

    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(|| default_db_path(&cli.output));
    let mut store = JsonFileStore::new(db_path);

    let mut estimator = MoveNetEstimator::new(&cli.model).map_err(|e| {
        AnalysisError::Config(format!("failed to load pose model {}: {}", cli.model.display(), e))
    })?;

    let options = ProcessOptions {
        input: cli.input.clone(),
        output: cli.output.clone(),
        config,
    };
    process_clip(&options, &mut estimator, &mut store)
}

fn default_db_path(output: &Path) -> PathBuf {
    output.with_file_name("komauchi_results.json")
}

fn dump_mi_csv(outcome: &ProcessOutcome) {
    println!("frame_index,motion_intensity,smoothed,state,w_displacement,w_velocity,w_acceleration,w_direction_change,w_pose_change");
    let analysis = &outcome.analysis;
    for t in 0..analysis.states.len() {
        let b = &analysis.mi.contributions[t];
        println!(
            "{},{:.6},{:.6},{},{:.6},{:.6},{:.6},{:.6},{:.6}",
            t,
            analysis.mi.raw[t],
            analysis.mi.smoothed[t],
            analysis.states[t].as_str(),
            b.displacement,
            b.velocity,
            b.acceleration,
            b.direction_change,
            b.pose_change
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(outcome) => {
            if cli.dump_mi {
                dump_mi_csv(&outcome);
            }
            let success = json!({
                "status": "success",
                "output_video_path": cli.output.to_string_lossy(),
                "database_id": outcome.database_id,
                "message": "Video processed successfully.",
            });
            println!("{}", success);
            Ok(())
        }
        Err(e) => {
            let error = json!({
                "status": "error",
                "error_type": e.error_type(),
                "message": e.to_string(),
            });
            eprintln!("{}", error);
            std::process::exit(1);
        }
    }
}
