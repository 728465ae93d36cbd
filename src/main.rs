use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use icopack_lib::commands::config::{get_config, set_config, ConfigUpdate};
use icopack_lib::commands::inspect::inspect;
use icopack_lib::commands::pack::{pack, PackRequest};
use icopack_lib::config::PackConfig;
use icopack_lib::logging::{init_logging, LogConfig};
use icopack_lib::ProberKind;
use std::path::PathBuf;

/// 将 PNG 图片打包为 Windows ICO 文件
#[derive(Parser)]
#[command(name = "icopack", version)]
struct Cli {
    /// 配置目录（默认使用系统配置目录，也可用 ICOPACK_CONFIG_DIR 指定）
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 打包 PNG 为 ICO
    Pack {
        /// 输入 PNG 文件，按顺序写入
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// 输出 ICO 文件
        #[arg(short, long)]
        output: PathBuf,

        /// 所有图片的位深（默认取配置，初始为 32）
        #[arg(long)]
        bpp: Option<u16>,

        /// 跳过 1-255 尺寸校验，宽高写为 0（即 256）
        #[arg(long)]
        ignore_size: bool,

        /// 尺寸探测器
        #[arg(long, value_enum)]
        prober: Option<ProberKind>,

        /// 按顺序逐个处理输入
        #[arg(long)]
        sequential: bool,
    },

    /// 查看 ICO 文件目录
    Inspect {
        file: PathBuf,

        /// 以 JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 查看或修改配置
    Config {
        #[arg(long)]
        default_bpp: Option<u16>,

        #[arg(long, value_enum)]
        prober: Option<ProberKind>,

        #[arg(long)]
        concurrent: Option<bool>,

        #[arg(long)]
        media_type: Option<String>,

        #[arg(long)]
        log_enabled: Option<bool>,

        /// error / warn / info / debug / trace
        #[arg(long)]
        log_level: Option<String>,

        /// 日志文件路径
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// 关闭文件日志
        #[arg(long, conflicts_with = "log_file")]
        no_log_file: bool,
    },
}

#[tokio::main]
async fn main() {
    std::process::exit(match run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {:?}", e);
            1
        }
    })
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_dir = cli.config_dir.unwrap_or_else(icopack_lib::config_dir);

    // guard 需要存活到 run 结束
    let _log_guard = init_logging(&LogConfig::load(&config_dir));
    tracing::debug!("配置目录: {:?}", config_dir);

    match cli.command {
        Command::Pack {
            inputs,
            output,
            bpp,
            ignore_size,
            prober,
            sequential,
        } => {
            let config = PackConfig::load(&config_dir);
            let request = PackRequest {
                inputs,
                output,
                bpp,
                ignore_size,
                prober,
                sequential,
            };
            let report = pack(&request, &config).await?;
            println!(
                "Created {} ({} images, {} bytes, {})",
                report.output.display(),
                report.images,
                report.bytes,
                report.media_type
            );
        }
        Command::Inspect { file, json } => {
            let report = inspect(&file).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report);
            }
        }
        Command::Config {
            default_bpp,
            prober,
            concurrent,
            media_type,
            log_enabled,
            log_level,
            log_file,
            no_log_file,
        } => {
            // 空路径表示关闭文件日志
            let log_file = if no_log_file {
                Some(PathBuf::new())
            } else {
                log_file
            };
            let update = ConfigUpdate {
                default_bpp,
                prober,
                concurrent,
                media_type,
                log_enabled,
                log_level,
                log_file,
            };
            let view = if update.is_empty() {
                get_config(&config_dir)
            } else {
                set_config(&config_dir, update)?
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&view).context("序列化配置失败")?
            );
        }
    }

    Ok(())
}
