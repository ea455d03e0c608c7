use crate::RuntimeMode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// トレーシングサブスクライバーを初期化
/// 本番は JSON、それ以外は人が読みやすい形式で出力する
pub fn init_tracing(mode: RuntimeMode) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if mode.is_production() {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_target(false).json())
            .with(filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(filter)
            .try_init()?;
    }

    Ok(())
}
