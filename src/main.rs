//! 服务主入口

use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tokio::signal;
use vidshare::{
    config::AppConfig,
    db,
    middleware::AppState,
    models::resource::{Comment, Playlist, Video},
    repository::{IdentityRepository, ResourceRepository},
    routes, telemetry,
};

const POOL_METRICS_PERIOD_SECS: u64 = 15;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("vidshare {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 加载 .env 文件（开发环境）
    // 按优先级加载：.env.local > .env
    if let Ok(path) = std::env::var("VIDSHARE_ENV") {
        dotenv::from_filename(format!(".env.{}", path)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();
    }

    // 1. 加载配置
    let config = AppConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config.logging);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "vidshare starting...");

    // 3. 数据库连接池 + 迁移
    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    tracing::info!("Database initialized");
    db::spawn_pool_metrics(db_pool.clone(), Duration::from_secs(POOL_METRICS_PERIOD_SECS));

    // 4. 构建应用状态
    let app_state = Arc::new(AppState::new(
        config.clone(),
        Arc::new(IdentityRepository::new(db_pool.clone())),
        Arc::new(ResourceRepository::<Comment>::new(db_pool.clone())),
        Arc::new(ResourceRepository::<Video>::new(db_pool.clone())),
        Arc::new(ResourceRepository::<Playlist>::new(db_pool.clone())),
    )?);

    // 5. 构建路由
    let app = routes::create_router(app_state);

    // 6. 启动服务器
    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    // 7. 优雅关闭
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 超时后不再等待连接归还
    let timeout = Duration::from_secs(config.server.graceful_shutdown_timeout_secs);
    if tokio::time::timeout(timeout, db_pool.close()).await.is_err() {
        tracing::warn!("Graceful shutdown timeout reached, forcing exit");
    }
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }
}

/// 打印帮助信息
fn print_help() {
    println!("vidshare {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: vidshare [选项]");
    println!();
    println!("选项:");
    println!("  --version     打印版本信息并退出");
    println!("  --help        打印此帮助信息并退出");
    println!();
    println!("环境变量:");
    println!("  所有配置通过 VIDSHARE_ 前缀的环境变量完成");
    println!("  例如 VIDSHARE_DATABASE__URL, VIDSHARE_SECURITY__ACCESS_TOKEN_SECRET");
}
