//! todo-api バイナリのエントリポイント

use anyhow::Context;
use infrastructure::Stores;
use shared::{init_tracing, Config, TokenService};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use todo_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("設定の読み込みに失敗しました")?;
    init_tracing(config.environment)
        .map_err(|e| anyhow::anyhow!("トレーシングの初期化に失敗しました: {e}"))?;
    tracing::info!(?config, "設定を読み込みました");
    if config.uses_development_secret {
        tracing::warn!(
            environment = config.environment.as_str(),
            "JWT_SECRET が未設定のため開発用の署名鍵を使用します"
        );
    }

    let stores = Stores::connect(&config).await;
    let state = AppState::new(stores, TokenService::new(&config.jwt_secret));

    let addr = SocketAddr::new(config.bind_addr, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("{addr} にバインドできません"))?;
    tracing::info!(%addr, "server starting");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("サーバーエラー")?;

    tracing::info!("server stopped");
    Ok(())
}

/// シグナルの待機
///
/// ハンドラの登録に失敗した場合はログを残して待ち続け、
/// 即座にシャットダウンが始まらないようにする。
async fn wait_for_signal<F>(signal: F, name: &str)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!(error = %e, "{name} ハンドラの登録に失敗しました");
        std::future::pending::<()>().await;
    }
}

/// Ctrl+C または SIGTERM で終了する
async fn shutdown_signal() {
    let ctrl_c = wait_for_signal(tokio::signal::ctrl_c(), "Ctrl+C");

    #[cfg(unix)]
    let terminate = wait_for_signal(
        async {
            let mut signal =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
            signal.recv().await;
            Ok::<(), io::Error>(())
        },
        "SIGTERM",
    );

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("シャットダウンを開始します");
}
